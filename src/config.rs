//! Command-line configuration: which image files to load, in order.

use std::path::PathBuf;

pub struct Config {
    pub image_paths: Vec<PathBuf>,
}

impl Config {
    /// Parses `args` (excluding the program name) into a `Config`.
    ///
    /// Every argument is treated as an image path; at least one is required.
    /// Returns a usage message, not an error type, since the only thing a
    /// caller does with it is print it and exit.
    pub fn parse<I: Iterator<Item = String>>(args: I) -> Result<Self, String> {
        let image_paths: Vec<PathBuf> = args.map(PathBuf::from).collect();
        if image_paths.is_empty() {
            return Err("usage: lc3-vm <image-file> [image-file ...]".to_string());
        }
        Ok(Self { image_paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_at_least_one_image() {
        let result = Config::parse(std::iter::empty());
        assert!(result.is_err());
    }

    #[test]
    fn collects_every_argument_as_an_image_path() {
        let args = vec!["a.obj".to_string(), "b.obj".to_string()];
        let config = Config::parse(args.into_iter()).unwrap();
        assert_eq!(config.image_paths, vec![PathBuf::from("a.obj"), PathBuf::from("b.obj")]);
    }
}
