use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{error::AppError, models::trip::Coordinate, planner::PinMode};

pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub cookie_secret: String,
    pub static_dir: PathBuf,
    pub map: MapConfig,
    pub pin_mode: PinMode,
    pub session_idle_timeout: Duration,
}

/// What the browser map widget is initialised with.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub center: Coordinate,
    pub zoom: u8,
    pub tile_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // London
            center: Coordinate::new(51.505, -0.09),
            zoom: 13,
            tile_url: DEFAULT_TILE_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = parse_or(&lookup, "APP_LISTEN_ADDR", "127.0.0.1:3000")?;

        let cookie_secret = lookup("COOKIE_SECRET")
            .unwrap_or_else(|| "change-me-paddle-far-paddle-often-cookie-secret".to_string());

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("static"));

        let defaults = MapConfig::default();
        let center = Coordinate::new(
            parse_or(&lookup, "MAP_CENTER_LAT", &defaults.center.latitude.to_string())?,
            parse_or(&lookup, "MAP_CENTER_LNG", &defaults.center.longitude.to_string())?,
        );
        if !center.is_within_bounds() {
            return Err(AppError::Config(format!(
                "map center {center} is outside valid coordinates"
            )));
        }
        let zoom: u8 = parse_or(&lookup, "MAP_ZOOM", &defaults.zoom.to_string())?;
        if zoom > 22 {
            return Err(AppError::Config(format!("MAP_ZOOM {zoom} is above 22")));
        }
        let tile_url = lookup("MAP_TILE_URL").unwrap_or(defaults.tile_url);
        if !(tile_url.contains("{z}") && tile_url.contains("{x}") && tile_url.contains("{y}")) {
            return Err(AppError::Config(
                "MAP_TILE_URL must contain {z}, {x} and {y} placeholders".into(),
            ));
        }

        let pin_mode: PinMode = parse_or(&lookup, "PIN_MODE", PinMode::default().as_str())?;

        let idle_minutes: u64 = parse_or(&lookup, "SESSION_IDLE_MINUTES", "120")?;
        if idle_minutes == 0 {
            return Err(AppError::Config("SESSION_IDLE_MINUTES must be at least 1".into()));
        }

        Ok(Self {
            listen_addr,
            cookie_secret,
            static_dir,
            map: MapConfig {
                center,
                zoom,
                tile_url,
            },
            pin_mode,
            session_idle_timeout: Duration::from_secs(idle_minutes.saturating_mul(60)),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|err| AppError::Config(format!("invalid {key}: {err}")))
}
