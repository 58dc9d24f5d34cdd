// Image download with bounded retry. This is the only retry loop in the
// program: the search endpoints are cheap single-shot calls, but image
// transfers are the largest and flakiest requests the device serves, so they
// get a fixed number of extra attempts with no backoff in between.

use std::fs;
use std::path::Path;

use log::warn;

use crate::api::DeviceApi;

/// Default number of retries after the first attempt (so 3 attempts total).
pub const DEFAULT_DOWNLOAD_RETRIES: u32 = 2;

/// Download `url` to `dest`, attempting up to `max_retries + 1` times.
///
/// Every failed attempt removes whatever partial file it left behind, so a
/// `false` return means `dest` is absent, and a `true` return means the file
/// is complete. Transport errors, non-success statuses and write errors all
/// count as a failed attempt.
pub fn download_image(api: &dyn DeviceApi, url: &str, dest: &Path, max_retries: u32) -> bool {
    let attempts = max_retries + 1;
    for attempt in 1..=attempts {
        match api.fetch_image(url, dest) {
            Ok(()) => return true,
            Err(e) => {
                warn!(
                    "Download attempt {}/{} for {} failed: {:#}",
                    attempt, attempts, url, e
                );
                // Never leave a half-written file on disk.
                let _ = fs::remove_file(dest);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CardInfoSearchResponse, FaceSearchResponse, UserInfoSearchResponse};
    use anyhow::Result;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;

    /// Fake device whose image endpoint fails a scripted number of times.
    /// Failing attempts still write a few bytes first, simulating a transfer
    /// that died partway through.
    struct FlakyImageDevice {
        failures_before_success: u32,
        attempts: Mutex<u32>,
        full_body: &'static [u8],
    }

    impl DeviceApi for FlakyImageDevice {
        fn search_users(&self, _: u32, _: u32) -> Result<UserInfoSearchResponse> {
            unimplemented!("not exercised by download tests")
        }

        fn search_face(&self, _: &str) -> Result<FaceSearchResponse> {
            unimplemented!("not exercised by download tests")
        }

        fn search_cards(&self, _: &str) -> Result<CardInfoSearchResponse> {
            unimplemented!("not exercised by download tests")
        }

        fn fetch_image(&self, _url: &str, dest: &Path) -> Result<()> {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            if *attempts <= self.failures_before_success {
                // Partial write, then a simulated transport failure.
                let mut f = File::create(dest)?;
                f.write_all(&self.full_body[..2])?;
                anyhow::bail!("connection reset mid-transfer");
            }
            let mut f = File::create(dest)?;
            f.write_all(self.full_body)?;
            Ok(())
        }
    }

    #[test]
    fn gives_up_after_all_attempts_and_removes_partial_file() {
        let device = FlakyImageDevice {
            failures_before_success: u32::MAX,
            attempts: Mutex::new(0),
            full_body: b"jpegbytes",
        };
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("1001.jpg");

        let ok = download_image(&device, "https://device/face/1001", &dest, 2);

        assert!(!ok);
        assert_eq!(*device.attempts.lock().unwrap(), 3);
        assert!(!dest.exists(), "failed download must not leave a partial file");
    }

    #[test]
    fn succeeds_on_final_attempt_with_intact_content() {
        let device = FlakyImageDevice {
            failures_before_success: 2,
            attempts: Mutex::new(0),
            full_body: b"jpegbytes",
        };
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("1001.jpg");

        let ok = download_image(&device, "https://device/face/1001", &dest, 2);

        assert!(ok);
        assert_eq!(*device.attempts.lock().unwrap(), 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpegbytes");
    }

    #[test]
    fn first_attempt_success_does_not_retry() {
        let device = FlakyImageDevice {
            failures_before_success: 0,
            attempts: Mutex::new(0),
            full_body: b"jpegbytes",
        };
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("7.jpg");

        assert!(download_image(&device, "https://device/face/7", &dest, 2));
        assert_eq!(*device.attempts.lock().unwrap(), 1);
    }
}
