extern crate iron;
extern crate staticfile;
extern crate persistent;
extern crate mount;
extern crate urlencoded;
extern crate multipart;

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate serde_derive;

mod error;
mod file_store;
mod form_controller;
mod map_renderer;
mod page;
mod record_store;
mod request_helpers;
mod schema;
mod settings;
mod tree_handlers;
mod tree_record;
mod util;

use iron::*;
use staticfile::Static;
use mount::Mount;
use persistent::{Read, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;
use error_chain::ChainedError;

use crate::error::{ErrorKind, Result, ResultExt};
use crate::file_store::FileStore;
use crate::map_renderer::MEDIA_URL_PREFIX;
use crate::record_store::RecordStore;
use crate::settings::Settings;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e.display_chain());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();

    let settings = Settings::from_env()?;
    let address = settings.get_address();

    // One server process is one session with its own table
    let store = RecordStore::in_memory()?;
    let file_store = FileStore::new(settings.get_upload_path());

    let mut mount = Mount::new();
    mount.mount("/", tree_handlers::index_handler);
    mount.mount("/trees", tree_handlers::trees_handler);
    mount.mount("/map", tree_handlers::map_handler);
    mount.mount(MEDIA_URL_PREFIX, Static::new(file_store.get_folder()));

    let mut chain = Chain::new(mount);
    chain.link(Write::<RecordStore>::both(store));
    chain.link(Read::<FileStore>::both(file_store));
    chain.link(Read::<Settings>::both(settings));

    info!("Running server on {}", address);
    let _listening = Iron::new(chain)
        .http(address.as_str())
        .chain_err(|| ErrorKind::ServerStartFailed(address.clone()))?;

    Ok(())
}
