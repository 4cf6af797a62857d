use std::{env, fmt::Display, ops::RangeBounds, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

/// Runtime settings, read from the environment. `main` loads `.env` first.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Where the proxy routes send their outbound requests.
    pub base_url: String,
    pub token_secret: Vec<u8>,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub proxy_timeout: Duration,
}

// Costs the bcrypt crate accepts
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;

impl Config {
    pub fn load() -> Self {
        let port = try_load("PORT", 2006);
        Self {
            host: try_load("HOST", "0.0.0.0".to_string()),
            port,
            data_dir: PathBuf::from(try_load("DATA_DIR", "data".to_string())),
            base_url: try_load("BASE_URL", format!("http://localhost:{port}")),
            token_secret: load_secret("TOKEN_SECRET"),
            token_ttl: Duration::from_secs(try_load_in("TOKEN_TTL_SECS", 3600, 1..)),
            bcrypt_cost: try_load_in("BCRYPT_COST", bcrypt::DEFAULT_COST, BCRYPT_COSTS),
            proxy_timeout: Duration::from_secs(try_load_in("PROXY_TIMEOUT_SECS", 5, 1..)),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Secrets stay out of Debug output
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("base_url", &self.base_url)
            .field("token_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("proxy_timeout", &self.proxy_timeout)
            .finish()
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

/// Like [`try_load`], but a value outside `allowed` also falls back to the default.
fn try_load_in<T, R>(key: &str, default: T, allowed: R) -> T
where
    T: FromStr + Display + PartialOrd + Clone,
    T::Err: Display,
    R: RangeBounds<T>,
{
    let value = try_load(key, default.clone());
    if allowed.contains(&value) {
        return value;
    }
    warn!("{key} value {value} is out of range, using default: {default}");
    default
}

fn load_secret(key: &str) -> Vec<u8> {
    match env::var(key) {
        Ok(secret) if !secret.is_empty() => secret.into_bytes(),
        _ => {
            warn!("{key} not set, tokens will not survive a restart");
            rand::random::<[u8; 32]>().to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_falls_back_on_garbage() {
        env::set_var("BOOKSHOP_TEST_PORT_GARBAGE", "not-a-port");
        assert_eq!(try_load("BOOKSHOP_TEST_PORT_GARBAGE", 2006u16), 2006);
    }

    #[test]
    fn test_try_load_reads_value() {
        env::set_var("BOOKSHOP_TEST_TTL", "60");
        assert_eq!(try_load("BOOKSHOP_TEST_TTL", 3600u64), 60);
        assert_eq!(try_load("BOOKSHOP_TEST_UNSET_KEY", 5u64), 5);
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        env::set_var("BOOKSHOP_TEST_COST_HIGH", "40");
        env::set_var("BOOKSHOP_TEST_COST_LOW", "2");
        env::set_var("BOOKSHOP_TEST_COST_OK", "10");
        env::set_var("BOOKSHOP_TEST_TTL_ZERO", "0");

        let cost = |key: &str| try_load_in(key, bcrypt::DEFAULT_COST, BCRYPT_COSTS);
        assert_eq!(cost("BOOKSHOP_TEST_COST_HIGH"), bcrypt::DEFAULT_COST);
        assert_eq!(cost("BOOKSHOP_TEST_COST_LOW"), bcrypt::DEFAULT_COST);
        assert_eq!(cost("BOOKSHOP_TEST_COST_OK"), 10);
        assert_eq!(try_load_in("BOOKSHOP_TEST_TTL_ZERO", 3600u64, 1..), 3600);
    }

    #[test]
    fn test_cost_bounds_match_bcrypt() {
        assert!(bcrypt::hash("pw", *BCRYPT_COSTS.start()).is_ok());
        assert!(bcrypt::hash("pw", *BCRYPT_COSTS.start() - 1).is_err());
        assert!(BCRYPT_COSTS.contains(&bcrypt::DEFAULT_COST));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 2006,
            data_dir: PathBuf::from("data"),
            base_url: "http://localhost:2006".into(),
            token_secret: b"hunter2".to_vec(),
            token_ttl: Duration::from_secs(60),
            bcrypt_cost: 4,
            proxy_timeout: Duration::from_secs(1),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(config.bind_address(), "127.0.0.1:2006");
    }
}
