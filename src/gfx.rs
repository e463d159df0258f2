use log::{debug, warn};
#[cfg(feature = "logging")]
use log::trace;

use crate::{
    clock::Clock,
    config::{Config, MergeStrategy},
    cycle::PaletteCycler,
    matcher::{match_color, ColorMatch},
    palette::{Color, EgaMix, Palette, Usage, EGA_COLORS, PALETTE_SIZE},
    remap::RemapTable,
    resource::{ResourceSource, DEFAULT_PALETTE, NO_RESOURCE},
    screen::{self, Display, MacClut},
    snapshot::PaletteState,
    vary::VarySession,
    PaletteError,
};

/// The interpreter's palette subsystem: owns the system palette and everything that feeds it.
pub struct GfxPalette {
    config: Config,
    sys: Palette,
    sys_changed: bool,
    /// Cleared by the renderer while a picture is half drawn; uploads wait until it's set again.
    picture_valid: bool,

    vary: Option<VarySession>,
    remap: RemapTable,
    cycler: PaletteCycler,
    clut: Option<MacClut>,

    display: Box<dyn Display>,
    resources: Box<dyn ResourceSource>,
    clock: Box<dyn Clock>,
}

impl GfxPalette {
    /// # Errors
    ///
    /// Returns an error if the configured color count matches no known display mode.
    pub fn new(
        config: Config,
        display: Box<dyn Display>,
        resources: Box<dyn ResourceSource>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, PaletteError> {
        config.validate()?;
        debug!(
            "palette: {:?} with {:?} color matching, {} colors",
            config.merge_strategy, config.match_mode, config.color_count
        );

        Ok(Self {
            config,
            sys: Palette::system(),
            sys_changed: false,
            picture_valid: true,
            vary: None,
            remap: RemapTable::new(),
            cycler: PaletteCycler::new(),
            clut: None,
            display,
            resources,
            clock,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn system_palette(&self) -> &Palette {
        &self.sys
    }

    pub fn total_color_count(&self) -> u16 {
        self.config.color_count
    }

    pub fn set_picture_valid(&mut self, valid: bool) {
        self.picture_valid = valid;
    }

    /// Decodes a palette resource with this session's byte order.
    pub fn load_palette(&self, id: u16) -> Option<Palette> {
        if id == NO_RESOURCE {
            return None;
        }
        let bytes = self.resources.palette(id)?;
        Some(Palette::decode(&bytes, self.config.endian))
    }

    /// Folds `candidate` into the system palette and records in its `mapping` where each of its
    /// colors ended up.
    ///
    /// Unless `force` is set, a candidate already folded in at the current timestamp is skipped.
    /// `force_real_merge` merges even when the session copies colors over.
    pub fn set(&mut self, candidate: &mut Palette, force: bool, force_real_merge: bool) {
        if !force && candidate.timestamp == self.sys.timestamp {
            return;
        }

        let changed = if force_real_merge || self.config.merge_strategy == MergeStrategy::Merge {
            self.merge(candidate, force, force_real_merge)
        } else {
            insert(candidate, &mut self.sys)
        };
        self.sys_changed |= changed;

        // Keeps the candidate from being folded in again without need.
        candidate.timestamp = self.sys.timestamp;

        let update_palette = self.sys_changed && self.picture_valid;

        if let Some(vary) = self.vary.as_mut() {
            // The vary owns the visible palette; new colors go into its starting point instead.
            insert(candidate, &mut vary.origin);
            self.vary_process(0, update_palette);
            return;
        }

        if update_palette {
            self.publish();
            self.sys_changed = false;
        }
    }

    fn merge(&mut self, candidate: &mut Palette, force: bool, force_real_merge: bool) -> bool {
        let mut changed = false;

        for slot in 1..PALETTE_SIZE - 1 {
            let new = candidate.colors[slot];
            if !new.is_used() {
                continue;
            }

            let current = &mut self.sys.colors[slot];
            if force || !current.is_used() {
                current.used = new.used;
                if !current.same_rgb(&new) {
                    current.set_rgb(new.rgb());
                    changed = true;
                }
                candidate.mapping[slot] = slot as u8;
                continue;
            }

            // Duplicate colors stay at their own slot instead of matching an earlier copy.
            if current.same_rgb(&new) {
                candidate.mapping[slot] = slot as u8;
                continue;
            }

            let matched = self.match_color(new.r, new.g, new.b);
            if matched.exact {
                candidate.mapping[slot] = matched.slot;
                continue;
            }

            match (1..PALETTE_SIZE).find(|&free| !self.sys.colors[free].is_used()) {
                Some(free) => {
                    self.sys.colors[free] = new;
                    candidate.mapping[slot] = free as u8;
                    changed = true;
                }
                None => {
                    #[cfg(feature = "logging")]
                    trace!("palette full, color {slot} shares slot {}", matched.slot);

                    candidate.mapping[slot] = matched.slot;
                    self.sys.colors[matched.slot as usize].used |= Usage::SHARED;
                }
            }

            #[cfg(feature = "logging")]
            trace!("color {slot} merged into slot {}", candidate.mapping[slot]);
        }

        if !force_real_merge {
            // Freshly decoded palettes carry 0; a merged system palette never does.
            self.sys.timestamp = self.sys.timestamp.max(self.clock.ticks()).max(1);
        }

        changed
    }

    /// Nearest used system palette slot for a color.
    pub fn match_color(&self, r: u8, g: u8, b: u8) -> ColorMatch {
        match_color(&self.sys, self.config.match_mode, r, g, b)
    }

    pub fn find_color(&self, r: u8, g: u8, b: u8) -> u8 {
        self.match_color(r, g, b).slot
    }

    /// Loads, decodes and sets a palette resource. Missing resources are ignored.
    pub fn set_from_resource(&mut self, id: u16, force: bool) {
        match self.load_palette(id) {
            Some(mut palette) => self.set(&mut palette, force, false),
            None => warn!("palette resource {id} not found"),
        }
    }

    /// Sets a view's embedded palette unconditionally.
    pub fn assert_palette(&mut self, candidate: &mut Palette) {
        self.set(candidate, true, false);
    }

    /// Called once a picture finished drawing.
    pub fn drew_picture(&mut self, picture_id: u16) {
        // Copying sessions only advance the timestamp per picture.
        if self.config.merge_strategy == MergeStrategy::Insert {
            self.sys.timestamp = self.sys.timestamp.wrapping_add(1);
        }

        if self.vary.is_some() {
            self.vary_load_target(picture_id);
        }
    }

    /// Initial palette for the display mode. Meant to be called once at start-up.
    pub fn set_default(&mut self) {
        if self.config.is_ega() {
            self.set_ega();
        } else if self.config.is_amiga() {
            warn!("amiga palettes are not supported, keeping the empty palette");
        } else {
            self.set_from_resource(DEFAULT_PALETTE, true);
        }
    }

    /// Fills the system palette with the EGA colors and their dithered mixes.
    pub fn set_ega(&mut self) {
        for (slot, color) in EGA_COLORS.iter().enumerate() {
            self.sys.colors[slot] = Color::used(color.r, color.g, color.b);
        }
        for slot in 0x10..=0xFEu8 {
            let mix = EgaMix::from(slot).color();
            self.sys.colors[slot as usize] = Color::used(mix.r, mix.g, mix.b);
        }
        self.sys.timestamp = 1;
        self.publish();
    }

    pub fn set_flag(&mut self, from: u16, to: u16, flag: u8) {
        for color in slot_range(&mut self.sys.colors, from, to) {
            color.used |= Usage::from_bits_retain(flag);
        }
    }

    pub fn unset_flag(&mut self, from: u16, to: u16, flag: u8) {
        for color in slot_range(&mut self.sys.colors, from, to) {
            color.used &= !Usage::from_bits_retain(flag);
        }
    }

    /// Sets the brightness of slots `from..to` in percent.
    pub fn set_intensity(&mut self, from: u16, to: u16, intensity: u8, set_palette: bool) {
        for entry in slot_range(&mut self.sys.intensity, from, to) {
            *entry = intensity;
        }
        if set_palette {
            self.publish();
        }
    }

    /// Rotates slots `from..to` if their cycle is due. Call [GfxPalette::animate_set] to show
    /// the result.
    pub fn animate(&mut self, from: u16, to: u16, speed: i16) -> bool {
        let now = self.clock.ticks();
        self.cycler.animate(&mut self.sys, from, to, speed, now)
    }

    pub fn animate_set(&mut self) {
        self.publish();
    }

    /// Packs the system colors, 4 bytes per slot.
    pub fn save_colors(&self) -> [u8; PALETTE_SIZE * 4] {
        self.sys.to_bytes()
    }

    /// Sets colors saved by [GfxPalette::save_colors].
    pub fn restore_colors(&mut self, bytes: &[u8]) -> Result<(), PaletteError> {
        let bytes: &[u8; PALETTE_SIZE * 4] = bytes
            .try_into()
            .map_err(|_| PaletteError::BadRestoreBuffer(bytes.len()))?;
        let mut restored = Palette::from_bytes(bytes);
        self.set(&mut restored, true, false);
        Ok(())
    }

    /// Installs or removes the platform color table overriding the system palette on screen.
    pub fn set_mac_clut(&mut self, bytes: Option<&[u8]>) -> Result<(), PaletteError> {
        self.clut = bytes.map(MacClut::new).transpose()?;
        Ok(())
    }

    pub fn sync_screen(&mut self) {
        self.publish();
    }

    /// Uploads the system palette to the display.
    pub fn publish(&mut self) {
        let mut colors = self.display.palette();
        screen::project(&self.sys, self.clut.as_ref(), &mut colors);

        if let Some(percent) = self.remap.take_pending_percent() {
            self.rebuild_remap_percent(percent);
        }

        self.display.set_palette(&colors, 0, PALETTE_SIZE);
    }

    pub fn remap(&self) -> &RemapTable {
        &self.remap
    }

    pub fn is_remapped(&self, color: u8) -> bool {
        self.remap.is_remapped(color)
    }

    /// The color to draw when `color` is painted over `screen_color`.
    ///
    /// # Errors
    ///
    /// Returns an error if `color` has no remapping; check [GfxPalette::is_remapped] first.
    pub fn remap_color(&self, color: u8, screen_color: u8) -> Result<u8, PaletteError> {
        self.remap.resolve(color, screen_color)
    }

    pub fn reset_remapping(&mut self) {
        self.remap.reset();
    }

    /// Makes `color` darken whatever it's drawn over to `percent`.
    pub fn set_remapping_percent(&mut self, color: u8, percent: u8) {
        self.remap.set_percent(color, percent);
        // Filled now for the current palette and again on the next upload.
        self.rebuild_remap_percent(percent);
    }

    pub fn set_remapping_range(&mut self, color: u8, from: u8, to: u8, base: u8) {
        self.remap.set_range(color, from, to, base);
    }

    fn rebuild_remap_percent(&mut self, percent: u8) {
        let sys = &self.sys;
        let mode = self.config.match_mode;
        self.remap.rebuild_percent(|screen_color| {
            let darkened = sys.colors[screen_color as usize].scaled(percent as u16);
            match_color(sys, mode, darkened.r, darkened.g, darkened.b).slot
        });
    }

    pub fn vary(&self) -> Option<&VarySession> {
        self.vary.as_ref()
    }

    pub fn is_vary_active(&self) -> bool {
        self.vary.is_some()
    }

    /// Starts blending the current palette towards palette resource `resource_id`.
    ///
    /// `step_stop` is where the blend halts, out of 64 steps; `ticks` is the time between steps.
    /// Returns false if a vary is already running or the resource can't be found.
    pub fn vary_init(&mut self, resource_id: u16, ticks: u16, step_stop: u16, direction: i16) -> bool {
        if self.vary.is_some() {
            return false;
        }
        let Some(target) = self.load_palette(resource_id) else {
            warn!("palette vary target {resource_id} not found");
            return false;
        };

        debug!("palette vary to {resource_id}, stop at {step_stop} every {ticks} ticks");
        self.vary = Some(VarySession::new(
            resource_id,
            self.sys.clone(),
            target,
            ticks,
            step_stop,
            direction,
        ));
        true
    }

    /// Turns the vary around. A `ticks` or `direction` of -1 keeps the current value.
    ///
    /// Returns the current step, or 0 without an active vary.
    pub fn vary_reverse(&mut self, ticks: i16, step_stop: u16, direction: i16) -> i16 {
        match self.vary.as_mut() {
            Some(vary) => {
                vary.reverse(ticks, step_stop, direction);
                vary.current_step()
            }
            None => 0,
        }
    }

    pub fn vary_current_step(&self) -> i16 {
        self.vary.as_ref().map_or(0, VarySession::current_step)
    }

    /// Copies the used colors of palette resource `resource_id` into the vary target.
    pub fn vary_change_target(&mut self, resource_id: u16) -> i16 {
        if self.vary.is_some() {
            if let Some(palette) = self.load_palette(resource_id) {
                if let Some(vary) = self.vary.as_mut() {
                    copy_used_colors(&palette, &mut vary.target);
                }
                self.vary_process(0, true);
            }
        }
        self.vary_current_step()
    }

    pub fn vary_change_ticks(&mut self, ticks: u16) {
        if let Some(vary) = self.vary.as_mut() {
            vary.change_ticks(ticks);
        }
    }

    pub fn vary_pause(&mut self, pause: bool) {
        if let Some(vary) = self.vary.as_mut() {
            vary.pause(pause);
        }
    }

    pub fn vary_deinit(&mut self) {
        if self.vary.take().is_some() {
            debug!("palette vary cancelled");
        }
    }

    /// Ticks between [GfxPalette::vary_increase_signal] calls, while the vary wants them.
    pub fn vary_timer_interval(&self) -> Option<u16> {
        self.vary
            .as_ref()
            .filter(|vary| vary.is_timer_armed())
            .map(VarySession::timer_interval)
    }

    /// Timer callback: requests one more step on the next [GfxPalette::vary_update].
    pub fn vary_increase_signal(&mut self) {
        if let Some(vary) = self.vary.as_mut() {
            vary.increase_signal();
        }
    }

    /// Applies the steps requested since the last update. Called from the frame loop.
    pub fn vary_update(&mut self) {
        let signal = self.vary.as_mut().map_or(0, VarySession::take_signal);
        if signal != 0 {
            self.vary_process(signal, true);
        }
    }

    /// Brings the system palette in line with the current step before a screen transition.
    pub fn vary_prepare_for_transition(&mut self) {
        if self.vary.is_some() {
            self.vary_process(0, false);
        }
    }

    /// Advances the vary by `signal` steps and recomputes the system palette.
    pub fn vary_process(&mut self, signal: i32, set_palette: bool) {
        let Some(vary) = self.vary.as_mut() else {
            return;
        };

        vary.advance(signal);
        #[cfg(feature = "logging")]
        trace!("palette vary step {} of {}", vary.step(), vary.step_stop());

        self.sys_changed |= vary.blend_into(&mut self.sys);

        if vary.step() == 0 {
            debug!("palette vary {} finished", vary.resource_id());
            self.vary = None;
        }

        if self.sys_changed && set_palette && self.picture_valid {
            self.publish();
            self.sys_changed = false;
        }
    }

    fn vary_load_target(&mut self, resource_id: u16) {
        if resource_id == NO_RESOURCE {
            self.vary = None;
            return;
        }

        let target = self.load_palette(resource_id);
        if let Some(vary) = self.vary.as_mut() {
            vary.resource_id = resource_id;
            match target {
                Some(target) => vary.target = target,
                None => warn!("palette vary target {resource_id} not found"),
            }
        }
    }

    /// Serializes the system palette and any running vary.
    pub fn save_state(&self, compress: bool) -> Vec<u8> {
        PaletteState::capture(&self.sys, self.vary.as_ref()).encode(compress)
    }

    /// Restores a state written by [GfxPalette::save_state] and shows it.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), PaletteError> {
        let state = PaletteState::decode(bytes)?;

        let mut palette = Palette::from_bytes(&state.colors);
        palette.intensity = *state.intensity;
        palette.timestamp = state.timestamp;
        palette.colors[0] = Color::used(0, 0, 0);
        palette.colors[PALETTE_SIZE - 1] = Color::used(255, 255, 255);

        self.sys = palette;
        self.vary = state.vary;
        self.cycler.clear();
        self.sys_changed = false;
        if self.picture_valid {
            self.publish();
        } else {
            self.sys_changed = true;
        }
        Ok(())
    }
}

/// Copies the used colors of slots 1-254 over at their own index and maps them there.
///
/// Returns whether any color changed.
pub fn insert(candidate: &mut Palette, dest: &mut Palette) -> bool {
    let changed = copy_used_colors(candidate, dest);
    for slot in 1..PALETTE_SIZE - 1 {
        if candidate.colors[slot].is_used() {
            candidate.mapping[slot] = slot as u8;
        }
    }
    changed
}

fn copy_used_colors(source: &Palette, dest: &mut Palette) -> bool {
    let mut changed = false;

    for slot in 1..PALETTE_SIZE - 1 {
        let new = &source.colors[slot];
        if !new.is_used() {
            continue;
        }
        let current = &mut dest.colors[slot];
        if !current.same_rgb(new) {
            current.set_rgb(new.rgb());
            changed = true;
        }
        current.used = new.used;
    }

    changed
}

fn slot_range<T>(entries: &mut [T; PALETTE_SIZE], from: u16, to: u16) -> &mut [T] {
    let to = (to as usize).min(PALETTE_SIZE);
    let from = (from as usize).min(to);
    &mut entries[from..to]
}
