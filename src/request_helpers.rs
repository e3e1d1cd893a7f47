use std::io::Read as IoRead;
use std::sync::{Arc, Mutex};

use iron::headers::ContentType;
use iron::typemap::Key;
use iron::*;
use multipart::server::Multipart;
use persistent::{Read, Write};
use serde::Serialize;
use urlencoded::UrlEncodedQuery;

use crate::error::{Error, ErrorKind, Result};
use crate::file_store::Upload;
use crate::form_controller::FormData;

/**
  Returns the value of a url query variable, `None` if the request has no such
  variable
*/
pub fn get_optional_get_variable(request: &mut Request, name: &str) -> Option<String>
{
    match request.get_ref::<UrlEncodedQuery>()
    {
        Ok(hash_map) => hash_map.get(name).and_then(|values| values.first().cloned()),
        Err(_) => None
    }
}

/**
  Reads every part of a `multipart/form-data` body. Parts with a file name are
  uploads, the rest are text fields. Browsers send a nameless file part when no
  file was picked, those are skipped.
*/
pub fn read_multipart_form(request: &mut Request) -> Result<FormData>
{
    let mut multipart = match Multipart::from_request(request) {
        Ok(multipart) => multipart,
        Err(_) => bail!(ErrorKind::NotMultipart)
    };

    let mut form = FormData::default();

    while let Some(mut field) = multipart.read_entry()? {
        let name = field.headers.name.to_string();
        let filename = field.headers.filename.clone();

        let mut content = vec!();
        field.data.read_to_end(&mut content)?;

        match filename {
            Some(ref filename) if filename.is_empty() => {}
            Some(ref filename) => {
                form.files.insert(name, Upload::new(filename, content));
            }
            None => {
                form.fields.insert(name, String::from_utf8(content)?);
            }
        }
    }

    Ok(form)
}

/**
  Returns the shared state stored in the request chain under `K`
*/
pub fn get_shared_state<K>(request: &mut Request) -> Result<Arc<Mutex<K::Value>>>
    where K: Key,
          K::Value: Send
{
    request.get::<Write<K>>()
        .map_err(|_| ErrorKind::SessionStateUnavailable.into())
}

/**
  Returns the read only state stored in the request chain under `K`
*/
pub fn get_read_state<K>(request: &mut Request) -> Result<Arc<K::Value>>
    where K: Key,
          K::Value: Send + Sync
{
    request.get::<Read<K>>()
        .map_err(|_| ErrorKind::SessionStateUnavailable.into())
}

/**
  Runs `action` with exclusive access to the shared state
*/
pub fn with_locked<T, R, F>(state: &Mutex<T>, action: F) -> Result<R>
    where F: FnOnce(&mut T) -> Result<R>
{
    let mut guard = state.lock()
        .map_err(|_| Error::from(ErrorKind::SessionStateUnavailable))?;

    action(&mut *guard)
}

pub fn html_response(status: status::Status, body: String) -> Response
{
    let mut response = Response::with((status, body));
    response.headers.set(ContentType::html());
    response
}

pub fn json_response<T: Serialize>(value: &T) -> Result<Response>
{
    let mut response = Response::with((status::Ok, serde_json::to_string(value)?));
    response.headers.set(ContentType::json());
    Ok(response)
}
