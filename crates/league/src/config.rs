use chrono::Duration;

const DEFAULT_INVITATION_WINDOW_MINUTES: i64 = 120;

/// Runtime configuration for league operations
#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub invitation_window_minutes: i64,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            invitation_window_minutes: DEFAULT_INVITATION_WINDOW_MINUTES,
        }
    }
}

impl LeagueConfig {
    pub fn from_env() -> Self {
        Self {
            invitation_window_minutes: std::env::var("INVITATION_WINDOW_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INVITATION_WINDOW_MINUTES),
        }
    }

    /// How long a kart-slot invitation stays open.
    pub fn invitation_window(&self) -> Duration {
        Duration::minutes(self.invitation_window_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_two_hours() {
        let config = LeagueConfig::default();
        assert_eq!(config.invitation_window(), Duration::hours(2));
    }
}
