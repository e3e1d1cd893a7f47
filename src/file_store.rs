use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use iron::typemap::Key;
use tracing::info;

use crate::error::{ErrorKind, Result, ResultExt};

/**
  A file received from the client together with the name it was uploaded as
 */
#[derive(Clone, PartialEq, Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: &str, bytes: Vec<u8>) -> Upload {
        Upload {
            filename: filename.to_owned(),
            bytes,
        }
    }
}

/**
  Stores uploaded media in a single folder under the name it was uploaded with.

  Uploads that share a name overwrite each other, the last write wins.
 */
#[derive(Clone, Debug)]
pub struct FileStore {
    folder: PathBuf,
}
impl Key for FileStore {
    type Value = FileStore;
}

impl FileStore {
    pub fn new(folder: PathBuf) -> FileStore {
        FileStore { folder }
    }

    pub fn get_folder(&self) -> &Path {
        &self.folder
    }

    /**
      Writes `upload` to `<folder>/<filename>` and returns that path. The folder
      is created if it does not exist yet. Without an upload nothing happens.
     */
    pub fn store(&self, upload: Option<&Upload>) -> Result<Option<String>> {
        let upload = match upload {
            Some(upload) => upload,
            None => return Ok(None),
        };

        let destination = self.destination_path(&upload.filename)?;

        write_upload(&self.folder, &destination, &upload.bytes)
            .chain_err(|| ErrorKind::UploadFailed(upload.filename.clone()))?;

        info!("Stored upload {} at {:?}", upload.filename, destination);
        Ok(Some(destination.to_string_lossy().into_owned()))
    }

    /**
      Only the final component of the client supplied name is used, the rest
      could point outside the folder
     */
    fn destination_path(&self, filename: &str) -> Result<PathBuf> {
        match Path::new(filename).file_name() {
            Some(name) => Ok(self.folder.join(name)),
            None => bail!(ErrorKind::InvalidUploadName(filename.to_owned())),
        }
    }
}

fn write_upload(folder: &Path, destination: &Path, content: &[u8]) -> Result<()> {
    fs::create_dir_all(folder)?;

    let mut file = File::create(destination)?;
    file.write_all(content)?;

    Ok(())
}
