use itertools::Itertools;

/// This method should display the time in a sensible format. If it is less than a second, it should
/// only display the milliseconds and microseconds. If it is less than a minute, it should display
/// the seconds and milliseconds. If it is less than an hour, it should display the minutes and
/// seconds. If it is less than a day, it should display the hours and minutes. If it is more than a
/// day, it should display the days and hours.
pub fn show_duration(duration: std::time::Duration) -> String {
    let ms = duration.as_millis();
    let us = duration.as_micros();
    let s = duration.as_secs();
    let m = s / 60;
    let h = m / 60;
    let d = h / 24;

    if d > 0 {
        format!("{}d {}h", d, h % 24)
    } else if h > 0 {
        format!("{}h {}m", h, m % 60)
    } else if m > 0 {
        format!("{}m {}s", m, s % 60)
    } else if s > 0 {
        format!("{}s {}ms", s, ms % 1000)
    } else if ms > 0 {
        format!("{}ms {}us", ms, us % 1000)
    } else {
        format!("{}us", us)
    }
}

/// Helper trait which can be used to display symbols, words, states and such.
pub trait Show {
    /// Returns a human readable representation of `self`. For a state index that should be
    /// for example q0, q1, q2, ... and for a word it is the concatenation of its symbols.
    /// This is mainly used for logging and error messages.
    fn show(&self) -> String;

    /// Show a collection of the thing, for a collection of states this should be {q0, q1, q2, ...}
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!("{{{}}}", iter.into_iter().map(|x| x.show()).join(", "))
    }
}

impl Show for char {
    fn show(&self) -> String {
        if self.is_control() || (self.is_whitespace() && *self != ' ') {
            format!("\\x{:02x}", *self as u32)
        } else {
            self.to_string()
        }
    }
}

impl Show for [char] {
    fn show(&self) -> String {
        if self.is_empty() {
            "ε".to_string()
        } else {
            self.iter().map(Show::show).join("")
        }
    }
}

impl Show for Vec<char> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl Show for u32 {
    fn show(&self) -> String {
        format!("q{self}")
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::{show_duration, Show};
    use std::time::Duration;

    #[test]
    fn words_and_states() {
        assert_eq!(Vec::<char>::new().show(), "ε");
        assert_eq!(vec!['a', 'b'].show(), "ab");
        assert_eq!(vec!['a', '\n'].show(), "a\\x0a");
        assert_eq!(3u32.show(), "q3");
        assert_eq!(u32::show_collection(&[0, 1]), "{q0, q1}");
    }

    #[test]
    fn durations() {
        assert_eq!(show_duration(Duration::from_micros(12)), "12us");
        assert_eq!(show_duration(Duration::from_millis(1500)), "1s 500ms");
        assert_eq!(show_duration(Duration::from_secs(125)), "2m 5s");
    }
}
