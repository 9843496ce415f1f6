use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetNameError {
    #[error("asset name must not be empty")]
    Empty,
    #[error("asset name must not start or end with '/'")]
    EdgeSlash,
    #[error("asset name must not contain '..'")]
    ParentTraversal,
    #[error("asset name contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Asset names are relative, lowercase, slash-separated paths without an
/// extension, e.g. `backdrops/desert` or `duke`.
pub(crate) fn validate_asset_name(name: &str) -> Result<(), AssetNameError> {
    if name.is_empty() {
        return Err(AssetNameError::Empty);
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(AssetNameError::EdgeSlash);
    }
    if name.contains("..") {
        return Err(AssetNameError::ParentTraversal);
    }
    match name
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(AssetNameError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_level_and_actor_names() {
        for name in ["l1", "backdrops/desert", "rigelatin_soldier", "tiles/cz-1"] {
            assert!(validate_asset_name(name).is_ok(), "name={name}");
        }
    }

    #[test]
    fn rejects_paths_that_escape_the_asset_dir() {
        assert_eq!(validate_asset_name(""), Err(AssetNameError::Empty));
        assert_eq!(validate_asset_name("/etc"), Err(AssetNameError::EdgeSlash));
        assert_eq!(validate_asset_name("levels/"), Err(AssetNameError::EdgeSlash));
        assert_eq!(
            validate_asset_name("a/../b"),
            Err(AssetNameError::ParentTraversal)
        );
        assert_eq!(
            validate_asset_name("L1.json"),
            Err(AssetNameError::InvalidCharacter { character: 'L' })
        );
    }
}
