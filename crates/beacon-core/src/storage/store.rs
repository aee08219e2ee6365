use core::fmt::Write as _;

use heapless::{String, Vec};

use super::{
    FileSystem,
    OpenMode,
    StorageError,
    kv::{self, Entry},
};
use crate::{
    config::{ConfigError, ProfileConfig, ProfileName, SystemConfig},
    defaults::files,
};

/// Largest configuration file the store reads or writes
pub const FILE_BUFFER_SIZE: usize = 2048;

const TEMP_SUFFIX: &str = ".tmp";
const VERIFY_CHUNK_SIZE: usize = 64;

/// Result of loading both configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedConfig {
    pub system: SystemConfig,
    pub profile: ProfileConfig,
}

/// Reads and writes the system and profile files.
///
/// Loading never fails: anything missing or unreadable is replaced by the
/// compiled-in defaults. Saving rewrites each file in full through a
/// temporary file, so a previous version is never left truncated.
pub struct ConfigStore<F: FileSystem> {
    fs: F,
    buffer: Vec<u8, FILE_BUFFER_SIZE>,
    staging: String<FILE_BUFFER_SIZE>,
}

impl<F: FileSystem> ConfigStore<F> {
    pub const fn new(fs: F) -> Self {
        Self {
            fs,
            buffer: Vec::new(),
            staging: String::new(),
        }
    }

    pub fn into_inner(self) -> F {
        self.fs
    }

    /// Load the system configuration and the active profile.
    pub async fn load(&mut self) -> LoadedConfig {
        let system = match read_file(&mut self.fs, files::SYSTEM_CFG, &mut self.buffer).await {
            Ok(()) => parse_system(&self.buffer).unwrap_or_else(|e| {
                log::warn!("config: {} is corrupt ({:?}), using defaults", files::SYSTEM_CFG, e);
                SystemConfig::default()
            }),
            Err(StorageError::NotFound) => {
                log::info!("config: {} not found, using defaults", files::SYSTEM_CFG);
                SystemConfig::default()
            }
            Err(e) => {
                log::warn!("config: cannot read {}: {:?}", files::SYSTEM_CFG, e);
                SystemConfig::default()
            }
        };

        let profile = match read_file(&mut self.fs, files::PROFILE_CFG, &mut self.buffer).await {
            Ok(()) => select_profile(&self.buffer, &system.active_profile),
            Err(StorageError::NotFound) => {
                log::info!("config: {} not found, using default profile", files::PROFILE_CFG);
                ProfileConfig::default()
            }
            Err(e) => {
                log::warn!("config: cannot read {}: {:?}", files::PROFILE_CFG, e);
                ProfileConfig::default()
            }
        };

        LoadedConfig { system, profile }
    }

    /// Persist the system configuration and one profile.
    ///
    /// Other profiles already in the profile file are kept. Both files are
    /// written and verified under temporary names before either is renamed
    /// into place, so a failed write leaves the previous pair untouched.
    pub async fn save(
        &mut self,
        system: &SystemConfig,
        profile: &ProfileConfig,
    ) -> Result<(), StorageError> {
        let Self { fs, buffer, staging } = self;

        let existing: &[u8] = match read_file(fs, files::PROFILE_CFG, buffer).await {
            Ok(()) => buffer.as_slice(),
            Err(StorageError::NotFound) => &[],
            Err(StorageError::InvalidData | StorageError::Full) => {
                log::warn!("config: dropping unreadable {}", files::PROFILE_CFG);
                &[]
            }
            Err(e) => return Err(e),
        };
        staging.clear();
        render_profiles(staging, existing, profile)?;
        let profile_temp = stage_file(fs, files::PROFILE_CFG, staging.as_bytes()).await?;

        staging.clear();
        render_system(staging, system)?;
        let system_temp = match stage_file(fs, files::SYSTEM_CFG, staging.as_bytes()).await {
            Ok(temp) => temp,
            Err(e) => {
                let _ = fs.remove(&profile_temp).await;
                return Err(e);
            }
        };

        // Profile first: the old system file still names a complete profile
        fs.rename(&profile_temp, files::PROFILE_CFG).await?;
        fs.rename(&system_temp, files::SYSTEM_CFG).await?;

        log::info!(
            "config: saved profile '{}' with admin prefix '{}'",
            system.active_profile.as_str(),
            system.admin_prefix.as_str()
        );
        Ok(())
    }

    /// Look up a persisted profile by name.
    ///
    /// An unreadable profile file counts as holding no profiles.
    pub async fn stored_profile(
        &mut self,
        name: &ProfileName,
    ) -> Result<Option<ProfileConfig>, StorageError> {
        match read_file(&mut self.fs, files::PROFILE_CFG, &mut self.buffer).await {
            Ok(()) => {}
            Err(StorageError::NotFound | StorageError::InvalidData | StorageError::Full) => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        let found = as_text(&self.buffer).and_then(|text| find_profile(text, name));
        Ok(found.unwrap_or_else(|e| {
            log::warn!("config: profile '{}' is corrupt ({:?})", name.as_str(), e);
            None
        }))
    }

    pub async fn asset_size(&mut self, path: &str) -> Result<usize, StorageError> {
        self.fs.size(path).await
    }

    pub async fn read_asset(
        &mut self,
        path: &str,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        self.fs.read(path, offset, buf).await
    }

    /// Write a static asset unless a file already exists at `path`.
    ///
    /// Returns whether the asset was written.
    pub async fn install_asset(&mut self, path: &str, data: &[u8]) -> Result<bool, StorageError> {
        match self.fs.size(path).await {
            Ok(_) => Ok(false),
            Err(StorageError::NotFound) => {
                replace_file(&mut self.fs, path, data).await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

/// Read a whole file into `buffer`.
async fn read_file<F: FileSystem, const N: usize>(
    fs: &mut F,
    path: &str,
    buffer: &mut Vec<u8, N>,
) -> Result<(), StorageError> {
    buffer.clear();
    let size = fs.size(path).await?;
    buffer.resize(size, 0).map_err(|()| StorageError::Full)?;

    let mut filled = 0;
    while filled < size {
        let n = fs.read(path, filled, &mut buffer[filled..]).await?;
        if n == 0 {
            return Err(StorageError::InvalidData);
        }
        filled += n;
    }
    Ok(())
}

/// Replace `path` with `data` via `<path>.tmp`.
async fn replace_file<F: FileSystem>(
    fs: &mut F,
    path: &str,
    data: &[u8],
) -> Result<(), StorageError> {
    let temp = stage_file(fs, path, data).await?;
    fs.rename(&temp, path).await
}

/// Write and verify `data` as `<path>.tmp`, returning the temporary name.
async fn stage_file<F: FileSystem>(
    fs: &mut F,
    path: &str,
    data: &[u8],
) -> Result<String<48>, StorageError> {
    let mut temp = String::<48>::new();
    write!(temp, "{}{}", path, TEMP_SUFFIX).map_err(|_| StorageError::NameTooLong)?;

    match fs.remove(&temp).await {
        Ok(()) | Err(StorageError::NotFound) => {}
        Err(e) => return Err(e),
    }
    fs.write(&temp, data, OpenMode::Truncate).await?;
    verify_file(fs, &temp, data).await?;
    Ok(temp)
}

async fn verify_file<F: FileSystem>(
    fs: &mut F,
    path: &str,
    expected: &[u8],
) -> Result<(), StorageError> {
    if fs.size(path).await? != expected.len() {
        return Err(StorageError::VerifyFailed);
    }
    let mut chunk = [0u8; VERIFY_CHUNK_SIZE];
    let mut offset = 0;
    while offset < expected.len() {
        let n = fs.read(path, offset, &mut chunk).await?;
        if n == 0 || chunk[..n] != expected[offset..offset + n] {
            return Err(StorageError::VerifyFailed);
        }
        offset += n;
    }
    Ok(())
}

#[derive(Debug)]
enum ParseError {
    Encoding,
    Format(kv::FormatError),
    Value(ConfigError),
}

fn as_text(data: &[u8]) -> Result<&str, ParseError> {
    core::str::from_utf8(data).map_err(|_| ParseError::Encoding)
}

fn parse_system(data: &[u8]) -> Result<SystemConfig, ParseError> {
    let mut config = SystemConfig::default();
    for entry in kv::entries(as_text(data)?) {
        let entry = entry.map_err(ParseError::Format)?;
        let value = entry.value().map_err(ParseError::Format)?;
        match config.set(entry.key, &value) {
            Ok(()) => {}
            Err(ConfigError::UnknownKey) => {
                log::debug!("config: ignoring unknown key '{}'", entry.key);
            }
            Err(e) => return Err(ParseError::Value(e)),
        }
    }
    Ok(config)
}

/// Pick the active profile, falling back to the persisted default profile
/// and then to the compiled-in one.
fn select_profile(data: &[u8], active: &ProfileName) -> ProfileConfig {
    let text = match as_text(data) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("config: {} is corrupt ({:?}), using default profile", files::PROFILE_CFG, e);
            return ProfileConfig::default();
        }
    };

    match find_profile(text, active) {
        Ok(Some(profile)) => return profile,
        Ok(None) => log::warn!("config: profile '{}' not found", active.as_str()),
        Err(e) => log::warn!("config: profile '{}' is corrupt ({:?})", active.as_str(), e),
    }

    let fallback = ProfileName::default();
    if *active != fallback {
        if let Ok(Some(profile)) = find_profile(text, &fallback) {
            return profile;
        }
    }
    ProfileConfig::default()
}

fn find_profile(text: &str, name: &ProfileName) -> Result<Option<ProfileConfig>, ParseError> {
    let mut profile = ProfileConfig::named(name.clone());
    let mut found = false;

    for entry in kv::entries(text) {
        let entry = entry.map_err(ParseError::Format)?;
        let Some((section, field)) = entry.section() else {
            continue;
        };
        if section != name.as_str() {
            continue;
        }
        found = true;
        let value = entry.value().map_err(ParseError::Format)?;
        match profile.set(field, &value) {
            Ok(()) | Err(ConfigError::UnknownKey) => {}
            Err(e) => return Err(ParseError::Value(e)),
        }
    }
    Ok(found.then_some(profile))
}

fn belongs_to(entry: &Entry<'_>, name: &ProfileName) -> bool {
    entry
        .section()
        .is_some_and(|(section, _)| section == name.as_str())
}

fn render_system(out: &mut impl core::fmt::Write, system: &SystemConfig) -> core::fmt::Result {
    kv::write_entry(out, SystemConfig::KEY_ACTIVE_PROFILE, system.active_profile.as_str())?;
    kv::write_entry(out, SystemConfig::KEY_ADMIN_PREFIX, system.admin_prefix.as_str())
}

/// Render the profile file: every other profile's lines as they were, then
/// the saved profile.
fn render_profiles(
    out: &mut impl core::fmt::Write,
    existing: &[u8],
    profile: &ProfileConfig,
) -> core::fmt::Result {
    if let Ok(text) = core::str::from_utf8(existing) {
        for entry in kv::entries(text).flatten() {
            if !belongs_to(&entry, &profile.name) {
                out.write_str(entry.line)?;
                out.write_char('\n')?;
            }
        }
    }

    let section = profile.name.as_str();
    let mut channel = String::<4>::new();
    write!(channel, "{}", profile.channel)?;

    kv::write_section_entry(out, section, ProfileConfig::KEY_SSID, &profile.ssid)?;
    kv::write_section_entry(out, section, ProfileConfig::KEY_CHANNEL, &channel)?;
    kv::write_section_entry(
        out,
        section,
        ProfileConfig::KEY_HIDDEN,
        if profile.hidden { "1" } else { "0" },
    )?;
    kv::write_section_entry(out, section, ProfileConfig::KEY_TITLE, &profile.title)?;
    kv::write_section_entry(out, section, ProfileConfig::KEY_MESSAGE, &profile.message)
}
