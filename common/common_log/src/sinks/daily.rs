/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! File sink rotated on a calendar schedule
//!
//! Records go to `<path>.daily`. A log4rs time trigger rolls it at the local day boundary
//! every `rotate_days` days into `<path>.daily.1`, `<path>.daily.2`, ... (newest first).
//! `<path>` is kept as a symlink to the active file unless a regular file owns that name.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use log::Record;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::time::{
    TimeTrigger, TimeTriggerConfig, TimeTriggerInterval,
};
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::Append;
use log4rs::encode::Encode;

use crate::error::LogError;

const ACTIVE_SUFFIX: &str = ".daily";
/// Rolled periods kept when no age limit is configured
const UNLIMITED_PERIODS: u32 = 366;

pub struct DailyRollingAppender {
    base: PathBuf,
    active: PathBuf,
    inner: RollingFileAppender,
}

impl fmt::Debug for DailyRollingAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DailyRollingAppender")
            .field("base", &self.base)
            .field("active", &self.active)
            .finish()
    }
}

impl DailyRollingAppender {
    /// # Errors
    ///
    /// * `LogError::ResolvePath` - If a relative `path` cannot be made absolute.
    /// * `LogError::Appender` - If the active file cannot be opened.
    pub fn new(
        path: impl AsRef<Path>,
        rotate_days: u32,
        max_age_days: u32,
        encoder: Box<dyn Encode>,
    ) -> Result<Self, LogError> {
        let path = path.as_ref();
        let base = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|dir| dir.join(path))
                .map_err(|source| LogError::ResolvePath { path: path.to_path_buf(), source })?
        };
        let active = with_suffix(&base, ACTIVE_SUFFIX);

        let trigger = TimeTrigger::new(TimeTriggerConfig {
            interval: TimeTriggerInterval::Day(i64::from(rotate_days.max(1))),
            modulate: true,
            max_random_delay: 0,
        });
        let rolled_pattern = format!("{}.{{}}", active.display());
        let roller = FixedWindowRoller::builder()
            .base(1)
            .build(&rolled_pattern, kept_periods(rotate_days, max_age_days))
            .map_err(|e| LogError::Appender(e.to_string()))?;
        let inner = RollingFileAppender::builder()
            .encoder(encoder)
            .build(&active, Box::new(CompoundPolicy::new(Box::new(trigger), Box::new(roller))))
            .map_err(|e| LogError::Appender(e.to_string()))?;

        link_alias(&base, &active);
        Ok(Self { base, active, inner })
    }

    /// Absolute path the sink was configured with.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File receiving records of the current period.
    pub fn active(&self) -> &Path {
        &self.active
    }
}

/// Rolled files kept so that `max_age_days` of history survives; 0 means no age limit.
pub fn kept_periods(rotate_days: u32, max_age_days: u32) -> u32 {
    match max_age_days {
        0 => UNLIMITED_PERIODS,
        age => age.div_ceil(rotate_days.max(1)).max(1),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(unix)]
fn link_alias(base: &Path, active: &Path) {
    use std::fs;

    // a regular file at the alias name belongs to another sink
    match fs::symlink_metadata(base) {
        Ok(meta) if !meta.file_type().is_symlink() => return,
        _ => {}
    }
    let tmp = with_suffix(base, "_symlink");
    let _ = fs::remove_file(&tmp);
    if std::os::unix::fs::symlink(active, &tmp).is_ok() && fs::rename(&tmp, base).is_err() {
        let _ = fs::remove_file(&tmp);
    }
}

#[cfg(not(unix))]
fn link_alias(_base: &Path, _active: &Path) {}

impl Append for DailyRollingAppender {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        self.inner.append(record)
    }

    fn flush(&self) {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;
    use crate::encoder::RecordEncoder;
    use log::Level;
    use std::fs;

    fn encoder() -> Box<dyn Encode> {
        Box::new(RecordEncoder::new(&LogConfig { forbid_time: true, ..Default::default() }))
    }

    fn write(appender: &DailyRollingAppender, msg: &str) {
        appender
            .append(&Record::builder().args(format_args!("{}", msg)).level(Level::Info).build())
            .unwrap();
        appender.flush();
    }

    #[test]
    fn test_kept_periods() {
        assert_eq!(kept_periods(1, 0), UNLIMITED_PERIODS);
        assert_eq!(kept_periods(1, 7), 7);
        assert_eq!(kept_periods(7, 30), 5);
        assert_eq!(kept_periods(7, 3), 1);
        assert_eq!(kept_periods(0, 2), 2);
    }

    #[test]
    fn test_writes_active_file_and_links_alias() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app.log");
        let appender = DailyRollingAppender::new(&base, 1, 7, encoder()).unwrap();
        assert_eq!(appender.active(), dir.path().join("app.log.daily"));

        write(&appender, "first");
        write(&appender, "second");
        assert_eq!(fs::read_to_string(appender.active()).unwrap(), "INFO\tfirst\nINFO\tsecond\n");
        #[cfg(unix)]
        {
            assert_eq!(fs::read_link(&base).unwrap(), appender.active());
            assert_eq!(fs::read_to_string(&base).unwrap(), "INFO\tfirst\nINFO\tsecond\n");
        }
    }

    #[test]
    fn test_regular_file_at_base_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app.log");
        fs::write(&base, "owned by the size rotated sink\n").unwrap();

        let appender = DailyRollingAppender::new(&base, 1, 0, encoder()).unwrap();
        write(&appender, "daily");
        assert_eq!(fs::read_to_string(&base).unwrap(), "owned by the size rotated sink\n");
        assert_eq!(fs::read_to_string(appender.active()).unwrap(), "INFO\tdaily\n");
    }

    #[test]
    fn test_relative_path_is_resolved() {
        let dir = tempfile::tempdir_in(".").unwrap();
        let relative = Path::new(dir.path().file_name().unwrap()).join("app.log");
        assert!(relative.is_relative());

        let appender = DailyRollingAppender::new(&relative, 1, 0, encoder()).unwrap();
        assert!(appender.base().is_absolute());
        assert!(appender.base().ends_with(&relative));
        assert!(dir.path().join("app.log.daily").exists());
    }
}
