//! Per-agent route consumption at constant speed.

use std::{collections::VecDeque, time::Duration};

use glam::Vec3;
use grid_duel_core::Route;

/// Outcome of advancing an agent by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveProgress {
    /// The agent has no route to follow.
    Idle,
    /// The agent is still walking toward a waypoint.
    Moving,
    /// The agent consumed the final waypoint during this tick.
    Completed,
}

/// Mutable movement state owned by a single agent.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentState {
    position: Vec3,
    route: VecDeque<Vec3>,
    moving: bool,
}

impl AgentState {
    /// Creates an idle agent standing at `position`.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            route: VecDeque::new(),
            moving: false,
        }
    }

    /// Current world-space position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Indicates whether the agent is walking a route.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// Waypoints left on the active route.
    #[must_use]
    pub fn remaining_waypoints(&self) -> usize {
        self.route.len()
    }

    /// Head of the active route, if any.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<Vec3> {
        self.route.front().copied()
    }

    /// Replaces the active route. An empty route leaves the agent idle.
    pub fn follow(&mut self, route: Route) {
        self.route = route.into_waypoints().into();
        self.moving = !self.route.is_empty();
    }

    /// Drops the active route and places the agent on `rest`.
    pub fn cancel(&mut self, rest: Vec3) {
        self.route.clear();
        self.position = rest;
        self.moving = false;
    }

    /// Moves the agent toward its next waypoint.
    ///
    /// When the distance coverable in `elapsed` reaches the waypoint the
    /// agent snaps onto it exactly and pops it; otherwise it moves along the
    /// straight line by the coverable distance. `Completed` is reported once,
    /// on the tick that pops the final waypoint.
    pub fn advance(&mut self, speed: f32, elapsed: Duration) -> MoveProgress {
        let Some(target) = self.route.front().copied() else {
            self.moving = false;
            return MoveProgress::Idle;
        };

        let offset = target - self.position;
        let reach = speed * elapsed.as_secs_f32();

        if reach >= offset.length() {
            self.position = target;
            let _ = self.route.pop_front();
            if self.route.is_empty() {
                self.moving = false;
                return MoveProgress::Completed;
            }
        } else {
            self.position += offset.normalize_or_zero() * reach;
        }

        MoveProgress::Moving
    }
}
