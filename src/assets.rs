//! Asset provider seam
//!
//! The simulation never loads anything itself. Spawns and scene assets are
//! requested by ticket; the provider answers later through `poll`, and the
//! frame driver feeds those answers back at a frame boundary.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::sim::EntityKind;

/// Opaque renderable produced by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub u32);

/// Identifies one outstanding request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket(pub u32);

/// Something the game can ask the provider for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Obstacle,
    Coin,
    Road,
    /// Player model, by file name (e.g. `player1.glb`)
    Character(String),
    /// Background texture, by file name (e.g. `jungle.jpg`)
    Theme(String),
}

impl AssetKey {
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Obstacle => AssetKey::Obstacle,
            EntityKind::Coin => AssetKey::Coin,
        }
    }

    /// Path relative to the site root
    pub fn path(&self) -> String {
        match self {
            AssetKey::Obstacle => "assets/obstacle.glb".to_string(),
            AssetKey::Coin => "assets/coin.glb".to_string(),
            AssetKey::Road => "assets/road.glb".to_string(),
            AssetKey::Character(name) | AssetKey::Theme(name) => format!("assets/{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },
}

/// A finished request
#[derive(Debug, Clone, PartialEq)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub key: AssetKey,
    pub result: Result<AssetHandle, AssetError>,
}

pub trait AssetProvider {
    /// Start loading `key`. Must not complete synchronously into game state;
    /// results are only observed through `poll`.
    fn request(&mut self, ticket: LoadTicket, key: AssetKey);

    /// Completions since the last poll
    fn poll(&mut self) -> Vec<LoadCompletion>;
}

/// Provider that answers every request on the next poll. Used by the headless
/// runner and tests; paths listed as missing fail with `NotFound`.
#[derive(Debug, Default)]
pub struct InstantAssets {
    ready: Vec<LoadCompletion>,
    missing: HashSet<String>,
    next_handle: u32,
}

impl InstantAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            missing: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Requests waiting for the next poll
    pub fn pending(&self) -> usize {
        self.ready.len()
    }
}

impl AssetProvider for InstantAssets {
    fn request(&mut self, ticket: LoadTicket, key: AssetKey) {
        let path = key.path();
        let result = if self.missing.contains(&path) {
            Err(AssetError::NotFound(path))
        } else {
            self.next_handle += 1;
            Ok(AssetHandle(self.next_handle))
        };
        self.ready.push(LoadCompletion {
            ticket,
            key,
            result,
        });
    }

    fn poll(&mut self) -> Vec<LoadCompletion> {
        std::mem::take(&mut self.ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_paths() {
        assert_eq!(AssetKey::Obstacle.path(), "assets/obstacle.glb");
        assert_eq!(AssetKey::for_kind(EntityKind::Coin).path(), "assets/coin.glb");
        assert_eq!(
            AssetKey::Character("player1.glb".into()).path(),
            "assets/player1.glb"
        );
        assert_eq!(AssetKey::Theme("jungle.jpg".into()).path(), "assets/jungle.jpg");
    }

    #[test]
    fn test_instant_assets_answer_on_poll() {
        let mut assets = InstantAssets::with_missing(["assets/coin.glb"]);
        assets.request(LoadTicket(1), AssetKey::Obstacle);
        assets.request(LoadTicket(2), AssetKey::Coin);
        assert_eq!(assets.pending(), 2);

        let done = assets.poll();
        assert_eq!(done.len(), 2);
        assert!(done[0].result.is_ok());
        assert_eq!(
            done[1].result,
            Err(AssetError::NotFound("assets/coin.glb".into()))
        );
        assert!(assets.poll().is_empty());
    }
}
