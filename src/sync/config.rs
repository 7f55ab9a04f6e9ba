pub mod api {
    pub const BASE_URL: &str = "https://codeforces.com/api/";
    pub const USER_AGENT: &str = concat!("cf-sync/", env!("CARGO_PKG_VERSION"));
}
pub mod pacing {
    use std::time::Duration;
    pub const REQUEST_DELAY: Duration = Duration::from_secs(2);
}
pub mod timeout {
    use std::time::Duration;
    pub const DEFAULT: Duration = Duration::from_secs(10);
    pub const EXTENDED: Duration = Duration::from_secs(30);
    pub const EXTENDED_ENDPOINTS: [&str; 4] = [
        "contest.standings",
        "contest.ratingChanges",
        "contest.status",
        "problemset.problems",
    ];
}
pub mod retry {
    use std::time::Duration;
    pub const RETRY_COUNT: u32 = 2;
    pub const BASE_DELAY: Duration = Duration::from_secs(1);
}
pub mod proxy {
    use std::time::Duration;
    pub const LIST_TIMEOUT: Duration = Duration::from_secs(10);
}
pub mod ttl {
    use std::time::Duration;
    pub const CONTEST_LIST: Duration = Duration::from_secs(60 * 60);
    pub const USER_RATING: Duration = Duration::from_secs(60 * 60);
    pub const CONTEST_RATING: Duration = Duration::from_secs(6 * 60 * 60);
    pub const STANDINGS: Duration = Duration::from_secs(5 * 60);
    pub const PROBLEMS: Duration = Duration::from_secs(6 * 60 * 60);
}
pub mod store {
    pub const DATABASE: &str = "cf-sync.sqlite3";
}
