use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenv::dotenv;
use iron::typemap::Key;

use crate::error::{ErrorKind, Result};
use crate::map_renderer::MapConfig;

#[derive(Clone, Debug)]
pub struct Settings
{
    address: String,
    upload_path: PathBuf,
    map: MapConfig,
}
impl Key for Settings { type Value = Settings; }

impl Settings
{
    pub fn get_defaults() -> Settings
    {
        Settings
        {
            address: "localhost:3000".to_string(),
            upload_path: PathBuf::from("uploads"),
            map: MapConfig::default(),
        }
    }

    /**
      Reads the settings from the environment, including a `.env` file if there
      is one. Unset variables keep their default value, variables that are set
      but can not be parsed are an error.
    */
    pub fn from_env() -> Result<Settings>
    {
        dotenv().ok();

        Settings::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Settings>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Settings::get_defaults();

        let address = lookup("TREE_CENSUS_ADDRESS").unwrap_or(defaults.address);
        let upload_path = lookup("UPLOAD_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_path);

        let mut map = defaults.map;
        map.center[0] = parse_setting(&lookup, "MAP_CENTER_LAT", map.center[0])?;
        map.center[1] = parse_setting(&lookup, "MAP_CENTER_LON", map.center[1])?;
        map.zoom = parse_setting(&lookup, "MAP_ZOOM", map.zoom)?;
        if let Some(url) = lookup("MAP_TILE_URL") {
            map.base_layer.url = url;
        }

        Ok(Settings { address, upload_path, map })
    }

    pub fn get_address(&self) -> String
    {
        self.address.clone()
    }

    pub fn get_upload_path(&self) -> PathBuf
    {
        self.upload_path.clone()
    }

    pub fn get_map_config(&self) -> &MapConfig
    {
        &self.map
    }
}

fn parse_setting<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
    where F: Fn(&str) -> Option<String>,
          T: FromStr
{
    match lookup(name) {
        Some(value) => value.trim()
            .parse()
            .map_err(|_| ErrorKind::InvalidSetting(name.to_owned(), value.clone()).into()),
        None => Ok(default),
    }
}
