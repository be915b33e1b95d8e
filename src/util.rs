pub const EOS_ADDRESS: &str = "EOS_ADDRESS";

pub const EOS_USERNAME: &str = "EOS_USERNAME";

pub const EOS_PASSWORD: &str = "EOS_PASSWORD";

pub const EOS_TRANSPORT: &str = "EOS_TRANSPORT";

pub const EOS_INSECURE: &str = "EOS_INSECURE";

pub const SAMPLING_INTERVAL: &str = "SAMPLING_INTERVAL";

/// Read an environment variable, treating empty values as unset.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
