//! Entity registry
//!
//! Live obstacles and coins, plus the two holding areas an entity passes
//! through before it goes live: `in_flight` (asset requested, not loaded yet)
//! and `staged` (loaded, waiting for the next tick boundary). Only
//! `commit_staged` moves entities into the live collections, so the pickup
//! evaluator never sees a half-built entity.

use glam::Vec3;

use super::state::{Entity, EntityKind};
use crate::assets::{AssetError, AssetHandle, LoadTicket};

/// A spawner's request for a new entity, pending its asset
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    /// Entity ID reserved for the spawn, doubles as the load ticket
    pub ticket: u32,
    pub kind: EntityKind,
    pub pos: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    obstacles: Vec<Entity>,
    coins: Vec<Entity>,
    staged: Vec<Entity>,
    in_flight: Vec<SpawnRequest>,
    /// Requests not yet handed to the asset provider
    outbox: Vec<SpawnRequest>,
}

impl EntityRegistry {
    /// Add a live entity directly, bypassing the asset round trip
    pub fn add(&mut self, entity: Entity) {
        match entity.kind {
            EntityKind::Obstacle => self.obstacles.push(entity),
            EntityKind::Coin => self.coins.push(entity),
        }
    }

    pub fn remove(&mut self, id: u32) -> Option<Entity> {
        if let Some(i) = self.obstacles.iter().position(|e| e.id == id) {
            return Some(self.obstacles.remove(i));
        }
        if let Some(i) = self.coins.iter().position(|e| e.id == id) {
            return Some(self.coins.remove(i));
        }
        None
    }

    pub fn get(&self, id: u32) -> Option<&Entity> {
        self.iter().find(|e| e.id == id)
    }

    /// All live entities, obstacles first
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.obstacles.iter().chain(self.coins.iter())
    }

    pub fn obstacles(&self) -> &[Entity] {
        &self.obstacles
    }

    pub fn coins(&self) -> &[Entity] {
        &self.coins
    }

    pub fn obstacles_mut(&mut self) -> &mut [Entity] {
        &mut self.obstacles
    }

    pub fn coins_mut(&mut self) -> &mut [Entity] {
        &mut self.coins
    }

    /// Drop every coin whose ID is listed. Returns how many were removed.
    pub fn remove_coins(&mut self, ids: &[u32]) -> usize {
        let before = self.coins.len();
        self.coins.retain(|c| !ids.contains(&c.id));
        before - self.coins.len()
    }

    /// Live entity count
    pub fn len(&self) -> usize {
        self.obstacles.len() + self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a spawn whose asset still has to load
    pub fn request(&mut self, request: SpawnRequest) {
        self.in_flight.push(request.clone());
        self.outbox.push(request);
    }

    /// Hand new requests to the asset provider
    pub fn take_requests(&mut self) -> Vec<SpawnRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Tickets still waiting on an asset, oldest first
    pub fn in_flight_tickets(&self) -> Vec<LoadTicket> {
        self.in_flight.iter().map(|r| LoadTicket(r.ticket)).collect()
    }

    /// Match a load completion to its request. A loaded asset stages the
    /// entity; a failed one drops the request and hands the error back.
    /// Unknown tickets are ignored.
    pub fn resolve(
        &mut self,
        ticket: LoadTicket,
        result: Result<AssetHandle, AssetError>,
    ) -> Result<Option<EntityKind>, AssetError> {
        let Some(i) = self.in_flight.iter().position(|r| r.ticket == ticket.0) else {
            log::debug!("No spawn waiting on load {}", ticket.0);
            return Ok(None);
        };
        let request = self.in_flight.remove(i);
        let handle = result?;
        self.staged
            .push(Entity::new(request.ticket, request.kind, request.pos, handle));
        Ok(Some(request.kind))
    }

    /// Frame boundary: move staged entities into the live collections.
    /// Returns what went live.
    pub fn commit_staged(&mut self) -> Vec<(u32, EntityKind)> {
        let staged = std::mem::take(&mut self.staged);
        let mut committed = Vec::with_capacity(staged.len());
        for entity in staged {
            committed.push((entity.id, entity.kind));
            self.add(entity);
        }
        committed
    }

    /// Forget all pending spawns. Returns how many were dropped.
    pub fn cancel_in_flight(&mut self) -> usize {
        let dropped = self.in_flight.len() + self.staged.len();
        self.in_flight.clear();
        self.outbox.clear();
        self.staged.clear();
        dropped
    }

    /// Remove entities more than `distance` behind `player_z` (larger z).
    /// Returns how many were culled.
    pub fn cull_behind(&mut self, player_z: f32, distance: f32) -> usize {
        let before = self.len();
        let keep = |e: &Entity| e.pos.z - player_z <= distance;
        self.obstacles.retain(keep);
        self.coins.retain(keep);
        before - self.len()
    }

    /// Sort live entities by ID
    pub fn normalize_order(&mut self) {
        self.obstacles.sort_by_key(|e| e.id);
        self.coins.sort_by_key(|e| e.id);
    }
}
