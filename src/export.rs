// Export pipeline: enumerate users page by page, enrich each one (face URL,
// image download, cards), and produce the normalized record list in
// enumeration order. Enrichment of different users is independent, so it runs
// on a small fixed pool of worker threads; results land in per-index slots so
// the output order always matches the order the device returned the users in.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use indicatif::ProgressBar;
use log::{info, warn};
use serde_json::Value;

use crate::api::DeviceApi;
use crate::download::{download_image, DEFAULT_DOWNLOAD_RETRIES};
use crate::model::{DeviceUser, ExportedUser};

/// Page size requested from the user listing endpoint.
pub const PAGE_SIZE: u32 = 50;

/// Default number of enrichment worker threads. The device serializes
/// requests internally under digest auth, so a small pool is the useful
/// upper bound.
pub const DEFAULT_WORKERS: usize = 4;

/// Tunables for one export run.
pub struct ExportOptions {
    pub workers: usize,
    pub download_retries: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            workers: DEFAULT_WORKERS,
            download_retries: DEFAULT_DOWNLOAD_RETRIES,
        }
    }
}

/// Page through the user listing until the device runs out of results.
///
/// Stops on the first page shorter than `page_size`, on a response missing
/// the expected structure, or on a transport failure. A mid-pagination
/// failure is not retried: whatever was collected so far is returned, and a
/// truncated user set beats a hung run.
pub fn fetch_all_users(api: &dyn DeviceApi, page_size: u32) -> Vec<DeviceUser> {
    let mut users = Vec::new();
    let mut position = 0u32;

    loop {
        let response = match api.search_users(position, page_size) {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    "User search failed at position {}, keeping {} users collected so far: {:#}",
                    position,
                    users.len(),
                    e
                );
                break;
            }
        };

        let page = match response.user_info_search.and_then(|s| s.user_info) {
            Some(p) => p,
            None => break,
        };

        let page_len = page.len() as u32;
        users.extend(page);

        if page_len < page_size {
            break;
        }
        position += page_size;
    }

    info!("Enumerated {} users", users.len());
    users
}

/// Look up the face image URL for one employee. Empty or missing match lists
/// mean "no face enrolled" and come back as `None`; a failed lookup also
/// comes back as `None` but is logged so the two cases can be told apart
/// after the fact.
pub fn resolve_face_url(api: &dyn DeviceApi, employee_no: &str) -> Option<String> {
    match api.search_face(employee_no) {
        Ok(response) => response
            .match_list
            .into_iter()
            .next()
            .and_then(|m| m.face_url),
        Err(e) => {
            warn!("Face lookup failed for employee {}: {:#}", employee_no, e);
            None
        }
    }
}

/// Fetch the card records for one employee. Missing structure or a failed
/// request both yield an empty list; card trouble never stops the run.
pub fn resolve_cards(api: &dyn DeviceApi, employee_no: &str) -> Vec<Value> {
    match api.search_cards(employee_no) {
        Ok(response) => response
            .card_info_search
            .and_then(|s| s.card_info)
            .unwrap_or_default(),
        Err(e) => {
            warn!("Card lookup failed for employee {}: {:#}", employee_no, e);
            Vec::new()
        }
    }
}

/// Enrich one user: face URL, image download (only when a URL exists), card
/// list, then normalization into the fixed output shape. The image lands in
/// `output_dir` as `<employeeNo>.jpg` and the record stores that relative
/// filename.
pub fn enrich_user(
    api: &dyn DeviceApi,
    user: DeviceUser,
    output_dir: &Path,
    download_retries: u32,
) -> ExportedUser {
    let employee_no = user.employee_no.clone();

    let face_url = resolve_face_url(api, &employee_no);
    let local_image_path = match &face_url {
        Some(url) => {
            let filename = format!("{}.jpg", employee_no);
            if download_image(api, url, &output_dir.join(&filename), download_retries) {
                Some(filename)
            } else {
                warn!("Image download failed for employee {}", employee_no);
                None
            }
        }
        None => None,
    };
    let cards = resolve_cards(api, &employee_no);

    ExportedUser::from_parts(user, face_url, local_image_path, cards)
}

/// Enrich all users on a bounded worker pool and return the records in
/// enumeration order. Workers claim users from a shared queue; each result is
/// written into the slot matching its input index, so no post-hoc sort is
/// needed. `progress` ticks once per finished user.
pub fn run_export(
    api: &dyn DeviceApi,
    users: Vec<DeviceUser>,
    output_dir: &Path,
    options: &ExportOptions,
    progress: &ProgressBar,
) -> Vec<ExportedUser> {
    let total = users.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = options.workers.min(total).max(1);
    let queue = Mutex::new(users.into_iter().enumerate());
    let slots: Vec<Mutex<Option<ExportedUser>>> = (0..total).map(|_| Mutex::new(None)).collect();
    let done = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let next = queue.lock().unwrap().next();
                let Some((index, user)) = next else {
                    break;
                };
                let record = enrich_user(api, user, output_dir, options.download_retries);
                *slots[index].lock().unwrap() = Some(record);
                done.fetch_add(1, Ordering::Relaxed);
                progress.inc(1);
            });
        }
    });

    debug_assert_eq!(done.load(Ordering::Relaxed), total);
    slots
        .into_iter()
        .map(|slot| {
            slot.into_inner()
                .unwrap()
                .expect("every queued user produces exactly one record")
        })
        .collect()
}
