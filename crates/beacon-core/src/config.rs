//! Configuration model: the system record and the named profile record.

use heapless::String;

use crate::defaults::DEFAULTS;

pub const ADMIN_PREFIX_SIZE: usize = 32;
pub const PROFILE_NAME_SIZE: usize = 16;
pub const SSID_SIZE: usize = 32;
pub const TITLE_SIZE: usize = 48;
pub const MESSAGE_SIZE: usize = 192;

/// Highest 2.4 GHz channel accepted for the access point
const MAX_CHANNEL: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    Empty,
    TooLong,
    InvalidCharacter,
    /// The admin prefix would mount administration at the URL root
    RootPrefix,
    OutOfRange,
    InvalidValue,
    UnknownKey,
}

/// Copy `value` into a bounded string.
pub(crate) fn bounded<const N: usize>(value: &str) -> Result<String<N>, ConfigError> {
    let mut out = String::new();
    out.push_str(value).map_err(|_| ConfigError::TooLong)?;
    Ok(out)
}

/// URL path prefix all administration routes are mounted under.
///
/// Always starts and ends with `/` and is never just `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrefix(String<ADMIN_PREFIX_SIZE>);

impl AdminPrefix {
    /// Validate and normalize a submitted prefix.
    ///
    /// Missing leading or trailing separators are added, so `cfg` becomes
    /// `/cfg/`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::Empty);
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/'))
        {
            return Err(ConfigError::InvalidCharacter);
        }

        let mut prefix = String::<ADMIN_PREFIX_SIZE>::new();
        if !raw.starts_with('/') {
            prefix.push('/').map_err(|_| ConfigError::TooLong)?;
        }
        prefix.push_str(raw).map_err(|_| ConfigError::TooLong)?;
        if !prefix.ends_with('/') {
            prefix.push('/').map_err(|_| ConfigError::TooLong)?;
        }

        if prefix.as_str() == "/" {
            return Err(ConfigError::RootPrefix);
        }
        if prefix.contains("//")
            || prefix.split('/').any(|segment| segment == "." || segment == "..")
        {
            return Err(ConfigError::InvalidCharacter);
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Strip the prefix from a request path.
    ///
    /// Returns the remaining route (possibly empty) when `path` lies under the
    /// prefix. The prefix without its trailing `/` also counts as the prefix.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        if let Some(rest) = path.strip_prefix(self.as_str()) {
            return Some(rest);
        }
        let bare = &self.as_str()[..self.0.len() - 1];
        (path == bare).then_some("")
    }
}

impl Default for AdminPrefix {
    fn default() -> Self {
        Self(bounded(DEFAULTS.admin_prefix).unwrap_or_default())
    }
}

/// Name of a profile, `[A-Za-z0-9_-]{1,16}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileName(String<PROFILE_NAME_SIZE>);

impl ProfileName {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::Empty);
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'))
        {
            return Err(ConfigError::InvalidCharacter);
        }
        bounded(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_default(&self) -> bool {
        self.as_str() == DEFAULTS.profile_name
    }
}

impl Default for ProfileName {
    fn default() -> Self {
        Self(bounded(DEFAULTS.profile_name).unwrap_or_default())
    }
}

/// Process-wide configuration, persisted in the system file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemConfig {
    pub active_profile: ProfileName,
    pub admin_prefix: AdminPrefix,
}

impl SystemConfig {
    pub const KEY_ACTIVE_PROFILE: &'static str = "active_profile";
    pub const KEY_ADMIN_PREFIX: &'static str = "admin_prefix";

    /// Apply one persisted `key=value` pair.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            Self::KEY_ACTIVE_PROFILE => self.active_profile = ProfileName::parse(value)?,
            Self::KEY_ADMIN_PREFIX => self.admin_prefix = AdminPrefix::parse(value)?,
            _ => return Err(ConfigError::UnknownKey),
        }
        Ok(())
    }
}

/// Access point behavior of one named profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub name: ProfileName,
    /// Broadcast network name; empty means derived from the hardware address
    pub ssid: String<SSID_SIZE>,
    pub channel: u8,
    pub hidden: bool,
    /// Heading of the captive landing page
    pub title: String<TITLE_SIZE>,
    /// Body text of the captive landing page
    pub message: String<MESSAGE_SIZE>,
}

impl ProfileConfig {
    pub const KEY_SSID: &'static str = "ssid";
    pub const KEY_CHANNEL: &'static str = "channel";
    pub const KEY_HIDDEN: &'static str = "hidden";
    pub const KEY_TITLE: &'static str = "title";
    pub const KEY_MESSAGE: &'static str = "message";

    /// Default field values under the given name.
    pub fn named(name: ProfileName) -> Self {
        Self {
            name,
            ssid: String::new(),
            channel: DEFAULTS.channel,
            hidden: false,
            title: bounded(DEFAULTS.ssid_prefix).unwrap_or_default(),
            message: String::new(),
        }
    }

    /// Apply one profile field by key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            Self::KEY_SSID => self.ssid = bounded(value.trim())?,
            Self::KEY_CHANNEL => self.channel = parse_channel(value)?,
            Self::KEY_HIDDEN => self.hidden = parse_flag(value)?,
            Self::KEY_TITLE => self.title = bounded(value.trim())?,
            Self::KEY_MESSAGE => self.message = bounded(value)?,
            _ => return Err(ConfigError::UnknownKey),
        }
        Ok(())
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self::named(ProfileName::default())
    }
}

fn parse_channel(value: &str) -> Result<u8, ConfigError> {
    let channel = value
        .trim()
        .parse::<u8>()
        .map_err(|_| ConfigError::InvalidValue)?;
    if (1..=MAX_CHANNEL).contains(&channel) {
        Ok(channel)
    } else {
        Err(ConfigError::OutOfRange)
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "" | "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}
