#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.driver, BrowserType::Firefox);
        assert!(config.headless);
        assert_eq!(config.window_size.width, 2880);
        assert_eq!(config.window_size.height, 1800);
        assert_eq!(config.log_directory, PathBuf::from("/tmp/k_auto_book/"));
        assert_eq!(config.bookstore.image_format, ImageFormat::Jpeg);
        assert_eq!(config.alphapolis.image_format, ImageFormat::Png);
        assert_eq!(config.bookstore.sleep_time, 0.5);
        assert_eq!(config.bookstore.bound_on_side, None);
        assert!(!config.ebookjapan.needs_login);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_json(
            r#"{
                "driver": "chrome",
                "webdriver_url": "http://localhost:9999",
                "headless": false,
                "window_size": {"width": 1280},
                "log_directory": "/var/tmp/autobook",
                "bookstore": {
                    "needs_login": true,
                    "username": "reader",
                    "password": "hunter2",
                    "image_format": "PNG",
                    "sleep_time": 1.5,
                    "bound_on_side": "left",
                    "filename_prefix": "vol1_"
                },
                "ebookjapan": {"image_format": 1, "bound_on_side": 1}
            }"#,
        )
        .unwrap();

        assert_eq!(config.driver, BrowserType::Chrome);
        assert_eq!(config.webdriver_url(), "http://localhost:9999");
        assert!(!config.headless);
        assert_eq!(config.window_size.width, 1280);
        assert_eq!(config.window_size.height, 1800);

        let bookstore = config.site(SiteKind::Bookstore);
        assert!(bookstore.needs_login);
        assert_eq!(bookstore.stored_credentials(), Some(("reader", "hunter2")));
        assert_eq!(bookstore.image_format, ImageFormat::Png);
        assert_eq!(bookstore.step_delay(), std::time::Duration::from_millis(1500));
        assert_eq!(bookstore.bound_on_side, Some(BindingSide::Left));
        assert_eq!(bookstore.filename_prefix, "vol1_");

        let ebookjapan = config.site(SiteKind::Ebookjapan);
        assert_eq!(ebookjapan.image_format, ImageFormat::Jpeg);
        assert_eq!(ebookjapan.bound_on_side, Some(BindingSide::Right));
    }

    #[test]
    fn test_unknown_enum_values_fail_fast() {
        let err = Config::from_json(r#"{"bookstore": {"image_format": "gif"}}"#).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));

        let err = Config::from_json(r#"{"ebookjapan": {"bound_on_side": "top"}}"#).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));

        let err = Config::from_json(r#"{"driver": "phantomjs"}"#).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn test_negative_sleep_time_rejected() {
        let err = Config::from_json(r#"{"alphapolis": {"sleep_time": -1}}"#).unwrap_err();
        assert!(err.to_string().contains("sleep_time"));
    }

    #[test]
    fn test_partial_credentials_are_ignored() {
        let config = Config::from_json(r#"{"bookstore": {"username": "reader"}}"#).unwrap();
        assert_eq!(config.bookstore.stored_credentials(), None);
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let config = Config::from_json(r#"{"bookstore": {"password": "hunter2"}}"#).unwrap();
        let debug = format!("{:?}", config.bookstore);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"log_directory": "/tmp/elsewhere"}}"#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.log_directory, PathBuf::from("/tmp/elsewhere"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let err = Config::load(Some(Path::new("/nonexistent/autobook.json"))).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
        assert!(err.is_fatal());
    }
}
