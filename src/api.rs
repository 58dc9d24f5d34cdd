// API module: a small blocking HTTP client that talks to the access-control
// device's ISAPI endpoints. Every request uses digest authentication, and the
// client optionally accepts the self-signed certificates these devices ship
// with. The `DeviceApi` trait is the seam the export pipeline works against,
// so tests can substitute a scripted fake for the real device.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use diqwest::blocking::WithDigestAuth;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::DeviceUser;

/// Chunk size used when streaming image bodies to disk.
const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// The four operations the export pipeline needs from the device. One
/// implementation talks HTTP; tests provide scripted fakes.
pub trait DeviceApi: Send + Sync {
    /// Fetch one page of the user listing starting at `search_position`.
    fn search_users(&self, search_position: u32, max_results: u32)
        -> Result<UserInfoSearchResponse>;

    /// Look up the enrolled face for one employee (at most one match).
    fn search_face(&self, employee_no: &str) -> Result<FaceSearchResponse>;

    /// Fetch the card records for one employee (single page, capped at 50).
    fn search_cards(&self, employee_no: &str) -> Result<CardInfoSearchResponse>;

    /// Stream one image to `dest`, truncating whatever was there. A single
    /// attempt; the retry policy lives in the `download` module.
    fn fetch_image(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Search condition for the user listing endpoint. Field names mirror the
/// ISAPI request schema exactly.
#[derive(Serialize)]
struct UserInfoSearchCond {
    #[serde(rename = "searchID")]
    search_id: String,
    #[serde(rename = "searchResultPosition")]
    search_result_position: u32,
    #[serde(rename = "maxResults")]
    max_results: u32,
    #[serde(rename = "userType")]
    user_type: String,
}

#[derive(Serialize)]
struct UserInfoSearchRequest {
    #[serde(rename = "UserInfoSearchCond")]
    cond: UserInfoSearchCond,
}

/// Response wrapper for the user listing. Both levels are optional: a device
/// at the end of its data simply omits them, and the enumerator treats that
/// as "no more pages".
#[derive(Debug, Deserialize)]
pub struct UserInfoSearchResponse {
    #[serde(rename = "UserInfoSearch")]
    pub user_info_search: Option<UserInfoSearch>,
}

#[derive(Debug, Deserialize)]
pub struct UserInfoSearch {
    #[serde(rename = "UserInfo")]
    pub user_info: Option<Vec<DeviceUser>>,
}

#[derive(Serialize)]
struct FaceSearchRequest {
    #[serde(rename = "searchResultPosition")]
    search_result_position: u32,
    #[serde(rename = "maxResults")]
    max_results: u32,
    #[serde(rename = "faceLibType")]
    face_lib_type: String,
    #[serde(rename = "FDID")]
    fdid: String,
    #[serde(rename = "FPID")]
    fpid: String,
}

#[derive(Debug, Deserialize)]
pub struct FaceSearchResponse {
    #[serde(rename = "MatchList", default)]
    pub match_list: Vec<FaceMatch>,
}

#[derive(Debug, Deserialize)]
pub struct FaceMatch {
    #[serde(rename = "faceURL")]
    pub face_url: Option<String>,
}

#[derive(Serialize)]
struct CardInfoSearchCond {
    #[serde(rename = "searchID")]
    search_id: String,
    #[serde(rename = "searchResultPosition")]
    search_result_position: u32,
    #[serde(rename = "maxResults")]
    max_results: u32,
    #[serde(rename = "EmployeeNoList")]
    employee_no_list: Vec<EmployeeNoEntry>,
}

#[derive(Serialize)]
struct EmployeeNoEntry {
    #[serde(rename = "employeeNo")]
    employee_no: String,
}

#[derive(Serialize)]
struct CardInfoSearchRequest {
    #[serde(rename = "CardInfoSearchCond")]
    cond: CardInfoSearchCond,
}

#[derive(Debug, Deserialize)]
pub struct CardInfoSearchResponse {
    #[serde(rename = "CardInfoSearch")]
    pub card_info_search: Option<CardInfoSearch>,
}

#[derive(Debug, Deserialize)]
pub struct CardInfoSearch {
    #[serde(rename = "CardInfo")]
    pub card_info: Option<Vec<serde_json::Value>>,
}

/// Blocking client for one device. Holds the reqwest client, the normalized
/// base URL and the credentials used for digest authentication on every call.
pub struct DeviceClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl DeviceClient {
    /// Build a client for `base_url` (any trailing slash is stripped).
    /// `accept_invalid_certs` is decided once here at construction; these
    /// devices almost always present self-signed certificates.
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(DeviceClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// POST a JSON body to an ISAPI path and parse the JSON response.
    fn post_json<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}?format=json", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send_with_digest_auth(&self.username, &self.password)
            .with_context(|| format!("Request to {} failed", path))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Device returned {} for {}: {}", status, path, txt);
        }
        let parsed = res
            .json()
            .with_context(|| format!("Parsing response from {}", path))?;
        Ok(parsed)
    }
}

impl DeviceApi for DeviceClient {
    fn search_users(
        &self,
        search_position: u32,
        max_results: u32,
    ) -> Result<UserInfoSearchResponse> {
        let req = UserInfoSearchRequest {
            cond: UserInfoSearchCond {
                search_id: "usersx".into(),
                search_result_position: search_position,
                max_results,
                user_type: "normal".into(),
            },
        };
        self.post_json("/ISAPI/AccessControl/UserInfo/Search", &req)
    }

    fn search_face(&self, employee_no: &str) -> Result<FaceSearchResponse> {
        let req = FaceSearchRequest {
            search_result_position: 0,
            max_results: 1,
            face_lib_type: "blackFD".into(),
            fdid: "1".into(),
            fpid: employee_no.to_string(),
        };
        self.post_json("/ISAPI/Intelligent/FDLib/FDSearch", &req)
    }

    fn search_cards(&self, employee_no: &str) -> Result<CardInfoSearchResponse> {
        let req = CardInfoSearchRequest {
            cond: CardInfoSearchCond {
                search_id: "cards".into(),
                search_result_position: 0,
                max_results: 50,
                employee_no_list: vec![EmployeeNoEntry {
                    employee_no: employee_no.to_string(),
                }],
            },
        };
        self.post_json("/ISAPI/AccessControl/CardInfo/Search", &req)
    }

    fn fetch_image(&self, url: &str, dest: &Path) -> Result<()> {
        let mut res = self
            .client
            .get(url)
            .send_with_digest_auth(&self.username, &self.password)
            .with_context(|| format!("Image request to {} failed", url))?;
        if !res.status().is_success() {
            anyhow::bail!("Device returned {} for image {}", res.status(), url);
        }

        // Stream in fixed-size chunks so large images never sit fully in
        // memory. `File::create` truncates any partial file left behind by
        // an earlier failed attempt.
        let mut file =
            File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut buf = [0u8; DOWNLOAD_CHUNK_SIZE];
        loop {
            let n = res
                .read(&mut buf)
                .with_context(|| format!("Failed reading image body from {}", url))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])
                .with_context(|| format!("Failed writing {}", dest.display()))?;
        }
        Ok(())
    }
}
