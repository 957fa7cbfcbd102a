use std::f64::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use log::debug;
use serde::Deserialize;

use super::snapshot::GraphSnapshot;

/// Squared separation below which two points are treated as coincident.
const COINCIDENT_SQ: f64 = 1e-12;
const INITIAL_RADIUS: f64 = 10.0;
/// Lowest separation floor the engine accepts, whatever the config says.
const MIN_SEPARATION: f64 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
	pub x: f64,
	pub y: f64,
}

impl Vec2 {
	pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn length_sq(self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	pub fn length(self) -> f64 {
		self.length_sq().sqrt()
	}

	pub fn distance(self, other: Vec2) -> f64 {
		(self - other).length()
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl Add for Vec2 {
	type Output = Vec2;
	fn add(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Vec2 {
	type Output = Vec2;
	fn sub(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Vec2 {
	type Output = Vec2;
	fn mul(self, rhs: f64) -> Vec2 {
		Vec2::new(self.x * rhs, self.y * rhs)
	}
}

impl AddAssign for Vec2 {
	fn add_assign(&mut self, rhs: Vec2) {
		*self = *self + rhs;
	}
}

impl SubAssign for Vec2 {
	fn sub_assign(&mut self, rhs: Vec2) {
		*self = *self - rhs;
	}
}

/// Tunables for the force layout. Any subset may be given as JSON.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Rest length of every spring.
	pub link_distance: f64,
	/// Spring stiffness per unit of edge weight.
	pub link_strength: f64,
	/// Upper bound on `link_strength * weight`, keeps heavy edges stable.
	pub max_link_strength: f64,
	pub center_strength: f64,
	/// Fraction of velocity kept from one tick to the next.
	pub velocity_damping: f64,
	pub alpha_decay: f64,
	pub alpha_min: f64,
	/// Alpha held while a node is being dragged.
	pub drag_alpha: f64,
	/// Separation floor for the repulsion term.
	pub min_distance: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			charge_strength: -200.0,
			link_distance: 80.0,
			link_strength: 0.1,
			max_link_strength: 1.0,
			center_strength: 0.05,
			velocity_damping: 0.6,
			alpha_decay: 0.01,
			alpha_min: 0.001,
			drag_alpha: 0.3,
			min_distance: 1.0,
		}
	}
}

#[derive(Clone, Copy, Debug, Default)]
struct Body {
	position: Vec2,
	velocity: Vec2,
	pin: Option<Vec2>,
}

#[derive(Clone, Copy, Debug)]
struct Spring {
	source: usize,
	target: usize,
	strength: f64,
	/// Share of the correction applied to the target; the source takes the rest.
	bias: f64,
}

/// Force-directed layout over one snapshot.
///
/// Bodies are indexed like `GraphSnapshot::nodes`. Springs are resolved once at
/// construction from the snapshot's id index; the snapshot's edges are untouched.
pub struct SimulationEngine {
	config: SimulationConfig,
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	forces: Vec<Vec2>,
	center: Vec2,
	alpha: f64,
	alpha_target: f64,
	stopped: bool,
}

/// Deterministic sunflower placement around the center.
fn initial_offset(index: usize) -> Vec2 {
	let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
	let angle = index as f64 * PI * (3.0 - 5f64.sqrt());
	Vec2::new(radius * angle.cos(), radius * angle.sin())
}

/// Stable pseudo-random unit vector for a pair of coincident nodes.
fn jiggle(a: usize, b: usize) -> Vec2 {
	let angle = ((a as f64) * 0.618_034 + (b as f64) * 0.414_214 + 0.37) * TAU;
	Vec2::new(angle.cos(), angle.sin())
}

fn accumulate_repulsion(bodies: &[Body], strength: f64, min_distance: f64, forces: &mut [Vec2]) {
	let min_sq = min_distance * min_distance;
	for i in 0..bodies.len() {
		for j in (i + 1)..bodies.len() {
			let mut delta = bodies[i].position - bodies[j].position;
			let mut distance_sq = delta.length_sq();
			if distance_sq < COINCIDENT_SQ {
				delta = jiggle(i, j) * min_distance;
				distance_sq = min_sq;
			}
			let push = delta * (-strength / distance_sq.max(min_sq));
			forces[i] += push;
			forces[j] -= push;
		}
	}
}

fn accumulate_springs(
	bodies: &[Body],
	springs: &[Spring],
	rest_length: f64,
	min_distance: f64,
	forces: &mut [Vec2],
) {
	for spring in springs {
		let mut delta = bodies[spring.target].position - bodies[spring.source].position;
		let mut length = delta.length();
		if length * length < COINCIDENT_SQ {
			delta = jiggle(spring.source, spring.target) * min_distance;
			length = min_distance;
		}
		let pull = delta * ((length - rest_length) / length * spring.strength);
		forces[spring.target] -= pull * spring.bias;
		forces[spring.source] += pull * (1.0 - spring.bias);
	}
}

fn accumulate_centering(bodies: &[Body], center: Vec2, strength: f64, forces: &mut [Vec2]) {
	let sum = bodies.iter().fold(Vec2::ZERO, |acc, b| acc + b.position);
	let centroid = sum * (1.0 / bodies.len() as f64);
	let pull = (center - centroid) * strength;
	for force in forces.iter_mut() {
		*force += pull;
	}
}

impl SimulationEngine {
	pub fn new(snapshot: &GraphSnapshot, mut config: SimulationConfig, center: Vec2) -> Self {
		config.min_distance = if config.min_distance.is_finite() {
			config.min_distance.max(MIN_SEPARATION)
		} else {
			SimulationConfig::default().min_distance
		};
		let count = snapshot.nodes().len();
		let bodies: Vec<Body> = (0..count)
			.map(|i| Body {
				position: center + initial_offset(i),
				..Body::default()
			})
			.collect();

		// Self-loops are excluded; duplicate edges each keep their own spring.
		let mut degree = vec![0usize; count];
		let mut ends = Vec::with_capacity(snapshot.edges().len());
		for edge in snapshot.edges() {
			if edge.is_self_loop() {
				continue;
			}
			if let Some((source, target)) = snapshot.endpoints(edge) {
				degree[source] += 1;
				degree[target] += 1;
				ends.push((source, target, edge.weight));
			}
		}
		let springs: Vec<Spring> = ends
			.into_iter()
			.map(|(source, target, weight)| Spring {
				source,
				target,
				strength: (config.link_strength * weight).min(config.max_link_strength),
				bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
			})
			.collect();

		debug!(
			"simulation engine initialized: {} bodies, {} springs",
			bodies.len(),
			springs.len()
		);

		Self {
			config,
			forces: vec![Vec2::ZERO; count],
			bodies,
			springs,
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			stopped: false,
		}
	}

	/// Advances the layout by one tick.
	pub fn step(&mut self) {
		if self.stopped || self.bodies.is_empty() {
			return;
		}
		if self.settled() {
			self.enforce_pins();
			return;
		}

		self.forces.clear();
		self.forces.resize(self.bodies.len(), Vec2::ZERO);
		accumulate_repulsion(
			&self.bodies,
			self.config.charge_strength,
			self.config.min_distance,
			&mut self.forces,
		);
		accumulate_springs(
			&self.bodies,
			&self.springs,
			self.config.link_distance,
			self.config.min_distance,
			&mut self.forces,
		);
		accumulate_centering(
			&self.bodies,
			self.center,
			self.config.center_strength,
			&mut self.forces,
		);

		let (alpha, damping) = (self.alpha, self.config.velocity_damping);
		for (body, force) in self.bodies.iter_mut().zip(&self.forces) {
			if let Some(pin) = body.pin {
				body.position = pin;
				body.velocity = Vec2::ZERO;
				continue;
			}
			let velocity = (body.velocity + *force * alpha) * damping;
			let position = body.position + velocity;
			if velocity.is_finite() && position.is_finite() {
				body.velocity = velocity;
				body.position = position;
			} else {
				body.velocity = Vec2::ZERO;
			}
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		self.alpha = self.alpha.max(0.0);
	}

	fn enforce_pins(&mut self) {
		for body in &mut self.bodies {
			if let Some(pin) = body.pin {
				body.position = pin;
				body.velocity = Vec2::ZERO;
			}
		}
	}

	/// Raises alpha to at least `target` so the layout visibly reacts again.
	pub fn reheat(&mut self, target: f64) {
		self.alpha = self.alpha.max(target);
	}

	/// Sets the value alpha decays toward. Zero lets the layout settle.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.max(0.0);
	}

	pub fn settled(&self) -> bool {
		self.alpha < self.config.alpha_min
	}

	/// Marks the engine as finished; later `step` calls do nothing.
	pub fn stop(&mut self) {
		if !self.stopped {
			debug!("simulation engine stopped");
			self.stopped = true;
		}
	}

	#[cfg(test)]
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Fixes body `index` at `at` until unpinned. Non-finite pins are refused.
	pub fn pin(&mut self, index: usize, at: Vec2) -> bool {
		match self.bodies.get_mut(index) {
			Some(body) if at.is_finite() => {
				body.pin = Some(at);
				true
			}
			_ => false,
		}
	}

	pub fn unpin(&mut self, index: usize) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.pin = None;
		}
	}

	#[cfg(test)]
	pub fn pin_of(&self, index: usize) -> Option<Vec2> {
		self.bodies.get(index).and_then(|b| b.pin)
	}

	pub fn position(&self, index: usize) -> Option<Vec2> {
		self.bodies.get(index).map(|b| b.position)
	}

	pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
		self.bodies.iter().map(|b| b.position)
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.bodies.len()
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	#[cfg(test)]
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	pub fn set_center(&mut self, center: Vec2) {
		if center.is_finite() {
			self.center = center;
		}
	}
}
