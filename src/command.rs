// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Typed Siril commands and the line-formatting rules behind them.
//!
//! Siril's scripting language is a flat, space-separated line:
//! a verb followed by positional arguments, `-flag` switches and
//! `-name=value` options. [`CommandLine`] implements the formatting rules
//! (values containing spaces are single-quoted) and the structs below are a
//! hand-written, representative command set — the verbs the session itself
//! issues plus the common script verbs. Anything else can be sent as a raw
//! string, which also implements [`SirilCommand`].

use std::fmt;

use crate::types::{
    FitsExtension, SequenceFilter, StackNorm, StackRejection, StackRejectionMaps, StackType,
    StackWeighting,
};

/// Anything that can be rendered as one Siril command line.
///
/// Implemented by every typed command in this module and by plain strings,
/// so callers can mix both freely.
pub trait SirilCommand: Send + Sync {
    /// The exact line to write to the command pipe (no trailing newline).
    fn render(&self) -> String;
}

impl SirilCommand for str {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl SirilCommand for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl<T: SirilCommand + ?Sized> SirilCommand for &T {
    fn render(&self) -> String {
        (**self).render()
    }
}

/// Builder for one command line: a verb plus formatted tokens.
#[derive(Debug, Clone)]
pub struct CommandLine {
    name: &'static str,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append a positional argument. Values containing spaces are wrapped in
    /// single quotes.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        let rendered = value.to_string();
        if rendered.contains(' ') {
            self.args.push(format!("'{rendered}'"));
        } else {
            self.args.push(rendered);
        }
        self
    }

    /// Append a `-name` switch when `on` is true.
    pub fn flag(mut self, name: &str, on: bool) -> Self {
        if on {
            self.args.push(format!("-{name}"));
        }
        self
    }

    /// Append a `-name=value` option when a value is present. The whole
    /// token is quoted when the value contains spaces.
    pub fn opt(mut self, name: &str, value: Option<impl fmt::Display>) -> Self {
        if let Some(value) = value {
            let rendered = value.to_string();
            if rendered.contains(' ') {
                self.args.push(format!("'-{name}={rendered}'"));
            } else {
                self.args.push(format!("-{name}={rendered}"));
            }
        }
        self
    }

    /// Append a pre-rendered token (enum-valued arguments such as
    /// `-norm=addscale`). Empty tokens are skipped.
    pub fn token(mut self, token: impl fmt::Display) -> Self {
        let rendered = token.to_string();
        if !rendered.is_empty() {
            self.args.push(rendered);
        }
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Settings addressable through `set`/`get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirilSetting {
    /// Memory management mode: 0 = ratio of free memory, 1 = fixed amount.
    MemMode,
    /// Fixed memory amount in GB (mem_mode 1).
    MemAmount,
    /// Ratio of free memory to use (mem_mode 0).
    MemRatio,
    /// Process images at 16 bits per channel instead of 32.
    Force16Bit,
}

impl SirilSetting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MemMode => "core.mem_mode",
            Self::MemAmount => "core.mem_amount",
            Self::MemRatio => "core.mem_ratio",
            Self::Force16Bit => "core.force_16bit",
        }
    }
}

impl fmt::Display for SirilSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Session and housekeeping commands
// ---------------------------------------------------------------------------

/// Set the current working directory.
#[derive(Debug, Clone)]
pub struct Cd {
    pub directory: String,
}

impl Cd {
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl SirilCommand for Cd {
    fn render(&self) -> String {
        CommandLine::new("cd").arg(&self.directory).to_string()
    }
}

/// Close the loaded image and sequence, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Close;

impl SirilCommand for Close {
    fn render(&self) -> String {
        "close".to_string()
    }
}

/// Quit the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exit;

impl SirilCommand for Exit {
    fn render(&self) -> String {
        "exit".to_string()
    }
}

/// List compilation and runtime capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities;

impl SirilCommand for Capabilities {
    fn render(&self) -> String {
        "capabilities".to_string()
    }
}

/// Liveness probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ping;

impl SirilCommand for Ping {
    fn render(&self) -> String {
        "ping".to_string()
    }
}

/// Fail unless Siril is at least the given version.
#[derive(Debug, Clone)]
pub struct Requires {
    pub version: String,
}

impl Requires {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl SirilCommand for Requires {
    fn render(&self) -> String {
        CommandLine::new("requires").arg(&self.version).to_string()
    }
}

/// Read a setting value, or list them all.
#[derive(Debug, Clone)]
pub enum Get {
    Variable(SirilSetting),
    /// Name and value list (`-a`).
    All,
    /// Detailed list (`-A`).
    Detailed,
}

impl SirilCommand for Get {
    fn render(&self) -> String {
        match self {
            Self::Variable(setting) => CommandLine::new("get").arg(setting).to_string(),
            Self::All => "get -a".to_string(),
            Self::Detailed => "get -A".to_string(),
        }
    }
}

/// Update a setting value.
#[derive(Debug, Clone)]
pub struct Set {
    pub variable: SirilSetting,
    pub value: String,
}

impl Set {
    pub fn new(variable: SirilSetting, value: impl fmt::Display) -> Self {
        Self {
            variable,
            value: value.to_string(),
        }
    }
}

impl SirilCommand for Set {
    fn render(&self) -> String {
        CommandLine::new("set")
            .arg(format!("{}={}", self.variable, self.value))
            .to_string()
    }
}

/// Limit the number of processing threads.
#[derive(Debug, Clone, Copy)]
pub struct SetCpu {
    pub count: u32,
}

impl SirilCommand for SetCpu {
    fn render(&self) -> String {
        CommandLine::new("setcpu").arg(self.count).to_string()
    }
}

/// Set the ratio of free memory used for stacking.
#[derive(Debug, Clone, Copy)]
pub struct SetMem {
    pub ratio: f64,
}

impl SirilCommand for SetMem {
    fn render(&self) -> String {
        CommandLine::new("setmem").arg(self.ratio).to_string()
    }
}

/// Set the FITS extension used and recognized by sequences.
#[derive(Debug, Clone, Copy)]
pub struct SetExt {
    pub extension: FitsExtension,
}

impl SirilCommand for SetExt {
    fn render(&self) -> String {
        CommandLine::new("setext").arg(self.extension).to_string()
    }
}

// ---------------------------------------------------------------------------
// Image and sequence commands
// ---------------------------------------------------------------------------

/// Load an image.
#[derive(Debug, Clone)]
pub struct Load {
    pub filename: String,
}

impl Load {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

impl SirilCommand for Load {
    fn render(&self) -> String {
        CommandLine::new("load").arg(&self.filename).to_string()
    }
}

/// Save the current image.
#[derive(Debug, Clone)]
pub struct Save {
    pub filename: String,
}

impl Save {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

impl SirilCommand for Save {
    fn render(&self) -> String {
        CommandLine::new("save").arg(&self.filename).to_string()
    }
}

/// Convert all images of a known format into a Siril sequence.
#[derive(Debug, Clone)]
pub struct Convert {
    pub base_name: String,
    pub debayer: bool,
    pub use_fitseq: bool,
    pub use_ser: bool,
    pub start_index: Option<u32>,
    pub output_dir: Option<String>,
}

impl Convert {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            debayer: false,
            use_fitseq: false,
            use_ser: false,
            start_index: None,
            output_dir: None,
        }
    }
}

impl SirilCommand for Convert {
    fn render(&self) -> String {
        CommandLine::new("convert")
            .arg(&self.base_name)
            .flag("debayer", self.debayer)
            .flag("fitseq", self.use_fitseq)
            .flag("ser", self.use_ser)
            .opt("start", self.start_index)
            .opt("out", self.output_dir.as_ref())
            .to_string()
    }
}

/// Calibrate a sequence using bias, dark and flat masters.
#[derive(Debug, Clone)]
pub struct Preprocess {
    pub sequence: String,
    pub bias: Option<String>,
    pub dark: Option<String>,
    pub flat: Option<String>,
    pub cfa: bool,
    pub debayer: bool,
    pub fix_xtrans: bool,
    pub equalize_cfa: bool,
    pub dark_optimization: bool,
    pub prefix: Option<String>,
    pub create_fitseq: bool,
    /// Detect hot and cold pixels from the master dark.
    pub cosmetic_from_dark: bool,
    /// Path to a bad pixel map; takes precedence over `cosmetic_from_dark`.
    pub cosmetic_bad_pixel_map: Option<String>,
}

impl Preprocess {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            bias: None,
            dark: None,
            flat: None,
            cfa: false,
            debayer: false,
            fix_xtrans: false,
            equalize_cfa: false,
            dark_optimization: false,
            prefix: None,
            create_fitseq: false,
            cosmetic_from_dark: false,
            cosmetic_bad_pixel_map: None,
        }
    }
}

impl SirilCommand for Preprocess {
    fn render(&self) -> String {
        let mut line = CommandLine::new("preprocess")
            .arg(&self.sequence)
            .opt("bias", self.bias.as_ref())
            .opt("dark", self.dark.as_ref())
            .opt("flat", self.flat.as_ref());
        if self.dark.is_some() && self.cosmetic_from_dark && self.cosmetic_bad_pixel_map.is_none() {
            line = line.token("-cc=dark");
        }
        if let Some(bpm) = &self.cosmetic_bad_pixel_map {
            line = line.opt("cc", Some("bpm")).arg(bpm);
        }
        line.flag("cfa", self.cfa)
            .flag("debayer", self.debayer)
            .flag("fix_xtrans", self.fix_xtrans)
            .flag("equalize_cfa", self.equalize_cfa)
            .flag("opt", self.dark_optimization)
            .opt("prefix", self.prefix.as_ref())
            .flag("fitseq", self.create_fitseq)
            .to_string()
    }
}

/// Stack a sequence.
#[derive(Debug, Clone)]
pub struct Stack {
    pub sequence: String,
    pub mode: StackType,
    pub norm: StackNorm,
    pub rejection: StackRejection,
    pub lower_rej: f64,
    pub higher_rej: f64,
    pub rejection_maps: StackRejectionMaps,
    pub filters: Vec<SequenceFilter>,
    pub filter_included: bool,
    pub fast_norm: bool,
    pub output_norm: bool,
    pub weighting: StackWeighting,
    pub rgb_equalization: bool,
    pub out: Option<String>,
}

impl Stack {
    /// Winsorized rejection stacking with 3/3 sigma bounds and no
    /// normalization — Siril's usual starting point.
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            mode: StackType::Rejection,
            norm: StackNorm::None,
            rejection: StackRejection::Winsorized,
            lower_rej: 3.0,
            higher_rej: 3.0,
            rejection_maps: StackRejectionMaps::None,
            filters: Vec::new(),
            filter_included: false,
            fast_norm: false,
            output_norm: false,
            weighting: StackWeighting::None,
            rgb_equalization: false,
            out: None,
        }
    }
}

impl SirilCommand for Stack {
    fn render(&self) -> String {
        let mut line = CommandLine::new("stack").arg(&self.sequence).token(self.mode);
        if self.mode == StackType::Rejection {
            line = line.token(self.rejection);
            if self.rejection != StackRejection::None {
                line = line.arg(self.lower_rej).arg(self.higher_rej);
                line = line.token(self.rejection_maps);
            }
        }
        line = line.token(self.norm);
        for filter in &self.filters {
            line = line.token(filter);
        }
        line.flag("filter-incl", self.filter_included)
            .flag("fastnorm", self.fast_norm)
            .flag("output_norm", self.output_norm)
            .token(self.weighting)
            .flag("rgb_equal", self.rgb_equalization)
            .opt("out", self.out.as_ref())
            .to_string()
    }
}
