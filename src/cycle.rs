use crate::palette::{Palette, PALETTE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Schedule {
    from: u16,
    due: u32,
}

/// Color cycling: rotates a range of palette slots whenever its schedule comes due.
#[derive(Debug, Default, Clone)]
pub struct PaletteCycler {
    schedules: Vec<Schedule>,
}

impl PaletteCycler {
    pub fn new() -> Self {
        Default::default()
    }

    /// Rotates slots `from..to` by one if the range is due at `now`.
    ///
    /// A positive speed moves every color one slot down, wrapping the first color to the end; a
    /// negative speed moves them up. `|speed|` is the number of ticks between rotations. Returns
    /// whether the palette changed.
    pub fn animate(&mut self, palette: &mut Palette, from: u16, to: u16, speed: i16, now: u32) -> bool {
        if to == 0 || from as usize >= PALETTE_SIZE || to as usize > PALETTE_SIZE {
            return false;
        }
        let interval = speed.unsigned_abs() as u32;

        let index = match self.schedules.iter().position(|s| s.from == from) {
            Some(index) => index,
            None => {
                self.schedules.push(Schedule {
                    from,
                    due: now.wrapping_add(interval),
                });
                self.schedules.len() - 1
            }
        };

        let schedule = &mut self.schedules[index];
        if schedule.due > now {
            return false;
        }

        let (from, to) = (from as usize, to as usize);
        let colors = &mut palette.colors;
        if speed > 0 {
            let color = colors[from];
            if from < to {
                colors[from..to].rotate_left(1);
            }
            colors[to - 1] = color;
        } else {
            let color = colors[to - 1];
            if from < to {
                colors[from..to].rotate_right(1);
            }
            colors[from] = color;
        }

        schedule.due = now.wrapping_add(interval);
        true
    }

    pub fn clear(&mut self) {
        self.schedules.clear();
    }
}
