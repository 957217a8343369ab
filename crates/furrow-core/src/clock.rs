//! Season clock for a single run.
//!
//! One tick is one season. The clock tracks the season about to be
//! simulated, its calendar year and the number of seasons simulated so
//! far. Counters saturate instead of failing: a run has no end state.

use furrow_types::Season;

/// Calendar position of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonClock {
    year: i32,
    season: Season,
    turn: u64,
}

impl SeasonClock {
    /// A clock at turn 0, in spring of `baseline_year`.
    pub const fn new(baseline_year: i32) -> Self {
        Self {
            year: baseline_year,
            season: Season::Spring,
            turn: 0,
        }
    }

    /// Create a clock from explicit parameters (state restoration).
    pub const fn from_parts(year: i32, season: Season, turn: u64) -> Self {
        Self { year, season, turn }
    }

    /// Current year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Season the next tick will simulate.
    pub const fn season(&self) -> Season {
        self.season
    }

    /// Seasons simulated so far.
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Move to the next season. Returns `true` if a new year started.
    pub const fn advance(&mut self) -> bool {
        self.turn = self.turn.saturating_add(1);
        let wrapped = self.season.closes_year();
        self.season = self.season.next();
        if wrapped {
            self.year = self.year.saturating_add(1);
        }
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_spring_at_turn_zero() {
        let clock = SeasonClock::new(2014);
        assert_eq!(clock.year(), 2014);
        assert_eq!(clock.season(), Season::Spring);
        assert_eq!(clock.turn(), 0);
    }

    #[test]
    fn four_advances_complete_a_year() {
        let mut clock = SeasonClock::new(2014);
        let wraps: Vec<bool> = (0..4).map(|_| clock.advance()).collect();
        assert_eq!(wraps, vec![false, false, false, true]);
        assert_eq!(clock.season(), Season::Spring);
        assert_eq!(clock.year(), 2015);
        assert_eq!(clock.turn(), 4);
    }

    #[test]
    fn from_parts_restores_state() {
        let mut clock = SeasonClock::from_parts(2030, Season::Winter, 63);
        assert!(clock.advance());
        assert_eq!(clock.year(), 2031);
        assert_eq!(clock.turn(), 64);
    }

    #[test]
    fn counters_saturate() {
        let mut clock = SeasonClock::from_parts(i32::MAX, Season::Winter, u64::MAX);
        clock.advance();
        assert_eq!(clock.turn(), u64::MAX);
        assert_eq!(clock.year(), i32::MAX);
        assert_eq!(clock.season(), Season::Spring);
    }
}
