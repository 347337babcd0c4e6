//! Image lookup and upload.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::AssetError;
use crate::markup::ResolvedAssets;
use crate::store::CardStore;

/// Find the file an image reference points at.
///
/// Absolute paths are used as they are. Relative references are tried under
/// the media folder first, then under the vault root.
pub fn locate_asset(reference: &str, vault_root: &Path, media_folder: &str) -> Option<PathBuf> {
    let candidates = |reference: &str| -> Vec<PathBuf> {
        let path = Path::new(reference);
        if path.is_absolute() {
            vec![path.to_path_buf()]
        } else {
            vec![vault_root.join(media_folder).join(path), vault_root.join(path)]
        }
    };

    let mut paths = candidates(reference);
    if reference.contains("%20") {
        paths.extend(candidates(&reference.replace("%20", " ")));
    }
    paths.into_iter().find(|p| p.is_file())
}

/// Upload a local file under its base filename.
pub async fn upload_asset<S: CardStore>(store: &S, path: &Path) -> Result<String, AssetError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| AssetError::NotFound(path.display().to_string()))?;

    let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    store
        .store_media_file(&filename, &STANDARD.encode(bytes))
        .await
        .map_err(|source| AssetError::Upload { filename, source })
}

/// Locate each reference and, unless `upload` is false, store it remotely.
///
/// References that cannot be found or uploaded are logged and left out, so
/// the renderer keeps them as written.
pub async fn resolve_assets<S: CardStore>(
    store: &S,
    references: &[String],
    vault_root: &Path,
    media_folder: &str,
    upload: bool,
) -> ResolvedAssets {
    let mut resolved = ResolvedAssets::new();

    for reference in references {
        let result = match locate_asset(reference, vault_root, media_folder) {
            None => Err(AssetError::NotFound(reference.clone())),
            Some(path) if upload => upload_asset(store, &path).await,
            Some(path) => Ok(path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| reference.clone())),
        };

        match result {
            Ok(filename) => {
                debug!(reference = %reference, filename = %filename, "resolved image");
                resolved.insert(reference.clone(), filename);
            }
            Err(e) => warn!("{}", e),
        }
    }

    resolved
}
