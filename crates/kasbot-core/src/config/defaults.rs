//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "kasbot".to_string()
}

pub fn default_data_dir() -> String {
    "~/.kasbot".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_api_port() -> u16 {
    3000
}

pub fn default_bridge_url() -> String {
    "http://127.0.0.1:3100".to_string()
}

pub fn default_poll_timeout() -> u64 {
    30
}

pub fn default_sheet_range() -> String {
    "A1".to_string()
}

pub fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

pub fn default_job_interval() -> u64 {
    60
}

pub fn default_label_prefix() -> String {
    "Kas: ".to_string()
}
