use chrono::Local;

use iron::*;
use iron::method::Method;
use tracing::{error, warn};

use crate::error::{Error, ErrorKind};
use crate::file_store::FileStore;
use crate::form_controller::{submit, Submission, TreeForm};
use crate::map_renderer::{render, Map, RenderedMap};
use crate::page::{render_page, Notice, Page, NO_TREES_NOTICE};
use crate::record_store::RecordStore;
use crate::request_helpers::{
    get_optional_get_variable,
    get_read_state,
    get_shared_state,
    html_response,
    json_response,
    read_multipart_form,
    with_locked,
};
use crate::settings::Settings;
use crate::tree_record::TreeRecord;

#[derive(Serialize)]
struct MapResponse<'a> {
    map: &'a Map,
    errors: Vec<String>,
    /// All stored trees, including the ones without a location
    tree_count: i64,
}

////////////////////////////////////////////////////////////////////////////////
//                      Public request handlers
////////////////////////////////////////////////////////////////////////////////

/**
  Shows the form and the map
*/
pub fn index_handler(request: &mut Request) -> IronResult<Response> {
    respond_with_page(request, vec!(), false, status::Ok)
}

/**
  `POST` adds a tree from a submitted form, `GET` lists the stored trees
*/
pub fn trees_handler(request: &mut Request) -> IronResult<Response> {
    match request.method {
        Method::Post => add_tree_handler(request),
        _ => view_trees_handler(request),
    }
}

/**
  Returns the map object with all markers as json
*/
pub fn map_handler(request: &mut Request) -> IronResult<Response> {
    let rendered = render_current_map(request)?;

    let errors = rendered.errors.iter()
        .map(Error::user_message)
        .collect();

    let tree_count = {
        let store = get_shared_state::<RecordStore>(request)?;
        with_locked(&*store, |store| store.count())?
    };

    Ok(json_response(&MapResponse { map: &rendered.map, errors, tree_count })?)
}

////////////////////////////////////////////////////////////////////////////////
//                      Private functions for handling requests
////////////////////////////////////////////////////////////////////////////////

fn add_tree_handler(request: &mut Request) -> IronResult<Response> {
    match handle_submission(request) {
        Ok(submission) => {
            let notice = Notice::success(submission.notice());
            respond_with_page(request, vec!(notice), false, status::Ok)
        }
        Err(e) => {
            error!("Tree submission failed: {}", e.user_message());

            let notice = Notice::error(format!("Failed to add tree: {}", e.user_message()));
            respond_with_page(request, vec!(notice), false, e.kind().iron_status())
        }
    }
}

fn view_trees_handler(request: &mut Request) -> IronResult<Response> {
    match get_optional_get_variable(request, "format").as_ref().map(String::as_str) {
        None | Some("html") => respond_with_page(request, vec!(), true, status::Ok),
        Some("json") => {
            let records = scan_records(request)?;
            Ok(json_response(&records)?)
        }
        Some(other) => Err(Error::from(ErrorKind::UnknownFormat(other.to_owned())).into()),
    }
}

fn handle_submission(request: &mut Request) -> Result<Submission, Error> {
    let form_data = read_multipart_form(request)?;
    let form = TreeForm::from_form_data(form_data, Local::now().date_naive())?;

    let files = get_read_state::<FileStore>(request)?;
    let store = get_shared_state::<RecordStore>(request)?;

    with_locked(&*store, |store| submit(&form, &files, store))
}

fn scan_records(request: &mut Request) -> Result<Vec<TreeRecord>, Error> {
    let store = get_shared_state::<RecordStore>(request)?;

    with_locked(&*store, |store| store.scan_all())
}

/**
  Builds the map from the current table. A table that can not be read gives an
  empty map with an error instead of failing the request.
*/
fn render_current_map(request: &mut Request) -> Result<RenderedMap, Error> {
    let settings = get_read_state::<Settings>(request)?;

    match scan_records(request) {
        Ok(records) => Ok(render(settings.get_map_config(), &records)),
        Err(e) => Ok(RenderedMap {
            map: Map::new(settings.get_map_config()),
            errors: vec!(e),
        }),
    }
}

/**
  Renders the full page. The map is always part of it, and when
  `show_records` is set so is the table of all trees.
*/
fn respond_with_page(
        request: &mut Request,
        mut notices: Vec<Notice>,
        show_records: bool,
        status: status::Status
    ) -> IronResult<Response>
{
    let records = if show_records {
        match scan_records(request) {
            Ok(records) => {
                if records.is_empty() {
                    notices.push(Notice::error(NO_TREES_NOTICE.to_owned()));
                }
                Some(records)
            }
            Err(e) => {
                notices.push(Notice::error(e.user_message()));
                None
            }
        }
    }
    else {
        None
    };

    let rendered = render_current_map(request)?;
    if let Some(message) = rendered.error_notice() {
        warn!("{}", message);
        notices.push(Notice::error(message));
    }

    let page = Page {
        notices,
        records: records.as_ref().map(Vec::as_slice).filter(|records| !records.is_empty()),
        map: &rendered.map,
        today: Local::now().date_naive(),
    };

    Ok(html_response(status, render_page(&page)?))
}
