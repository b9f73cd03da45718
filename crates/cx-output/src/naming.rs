//! Output file naming.
//!
//! A session's file name is built from its metadata and the local time:
//!
//! ```text
//! {experiment}_{subject}_{condition}_{yy-mm-dd-HH-MM}.csv
//! ```
//!
//! Empty components are skipped.  With `tfseparator = Some("-")` the
//! separator is inserted between every `%` directive of the time format, so
//! `%y%m%d%H%M` becomes `%y-%m-%d-%H-%M`.

use chrono::{Local, NaiveDateTime};
use cx_core::Metadata;

/// Formatting knobs for [`namefile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameOptions {
    /// `strftime` format for the timestamp; `None` omits the timestamp.
    pub timeformat:  Option<String>,
    /// Inserted between time-format directives; `None` leaves the format as is.
    pub tfseparator: Option<String>,
    /// Joins the name components.
    pub separator:   String,
    /// File extension, with or without a leading dot.
    pub extension:   String,
}

impl Default for NameOptions {
    fn default() -> Self {
        Self {
            timeformat:  Some("%y%m%d%H%M".into()),
            tfseparator: Some("-".into()),
            separator:   "_".into(),
            extension:   "csv".into(),
        }
    }
}

impl NameOptions {
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn without_time(mut self) -> Self {
        self.timeformat = None;
        self
    }

    /// The time format after separator insertion.
    fn effective_timeformat(&self) -> Option<String> {
        let fmt = self.timeformat.as_deref()?;
        let Some(sep) = self.tfseparator.as_deref() else {
            return Some(fmt.to_owned());
        };
        let directives: Vec<&str> = fmt.split('%').filter(|c| !c.is_empty()).collect();
        Some(format!("%{}", directives.join(&format!("{sep}%"))))
    }
}

/// Name an output file for `meta`, stamped with the current local time.
pub fn namefile(meta: &Metadata, opts: &NameOptions) -> String {
    namefile_at(meta, opts, Local::now().naive_local())
}

/// Like [`namefile`] with an explicit timestamp.
pub fn namefile_at(meta: &Metadata, opts: &NameOptions, now: NaiveDateTime) -> String {
    let stamp = opts
        .effective_timeformat()
        .map(|fmt| now.format(&fmt).to_string())
        .unwrap_or_default();

    let stem = [meta.get("experiment"), meta.get("subject"), meta.get("condition"), stamp.as_str()]
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(&opts.separator);

    if opts.extension.starts_with('.') {
        format!("{stem}{}", opts.extension)
    } else {
        format!("{stem}.{}", opts.extension)
    }
}
