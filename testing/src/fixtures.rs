//! Canonical catalog entries and reviews shared by every test suite.

use chrono::NaiveDate;
use movies_core::{MovieInfo, Review};

fn cast(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// "Batman Begins" (2005), no id.
#[must_use]
pub fn batman_begins() -> MovieInfo {
    MovieInfo {
        release_date: date(2005, 6, 15),
        ..MovieInfo::new("Batman Begins", 2005, cast(&["Christian Bale", "Michael Caine"]))
    }
}

/// "The Dark Knight" (2008), no id.
#[must_use]
pub fn dark_knight() -> MovieInfo {
    MovieInfo {
        release_date: date(2008, 7, 18),
        ..MovieInfo::new("The Dark Knight", 2008, cast(&["Christian Bale", "HeathLedger"]))
    }
}

/// "Dark Knight Rises" (2012) with the fixed id `abc`.
#[must_use]
pub fn dark_knight_rises() -> MovieInfo {
    MovieInfo {
        release_date: date(2012, 7, 20),
        ..MovieInfo::new(
            "Dark Knight Rises",
            2012,
            cast(&["Christian Bale", "Tom Hardy"]),
        )
        .with_id("abc")
    }
}

/// The three catalog entries above, in that order.
#[must_use]
pub fn movie_infos() -> Vec<MovieInfo> {
    vec![batman_begins(), dark_knight(), dark_knight_rises()]
}

/// Two reviews for movie `1` and one for movie `2`, no ids.
#[must_use]
pub fn reviews() -> Vec<Review> {
    vec![
        Review::new("1", "Awesome Movie", 9.0),
        Review::new("1", "Awesome Movie1", 9.0),
        Review::new("2", "Excellent Movie", 8.0),
    ]
}
