use bevy::math::DVec2;
use bevy::prelude::*;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use thiserror::Error;

use crate::physics::{distance, ForceLaw, ForceProfile};

pub const POSITIVE_COLOR: Color = Color::srgb(1.0, 0.0, 0.0);
pub const NEGATIVE_COLOR: Color = Color::srgb(0.0, 0.0, 1.0);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("body mass must be finite and non-zero, got {0}")]
    InvalidMass(f64),
    #[error("mass distribution {0:?} cannot produce a finite non-zero mass")]
    DegenerateMassDistribution(MassDistribution),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MassDistribution {
    /// Uniform in `(0, max)`.
    Positive { max: f64 },
    /// Uniform in `(-span / 2, span / 2)`.
    Signed { span: f64 },
}

impl MassDistribution {
    /// Sampling redraws zeros, so a zero-width range would never return.
    pub fn validate(&self) -> Result<(), SimError> {
        let width = match *self {
            MassDistribution::Positive { max } => max,
            MassDistribution::Signed { span } => span,
        };
        if width == 0.0 || !width.is_finite() {
            return Err(SimError::DegenerateMassDistribution(*self));
        }
        Ok(())
    }
}

impl Distribution<f64> for MassDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let m = match *self {
                MassDistribution::Positive { max } => rng.gen::<f64>() * max,
                MassDistribution::Signed { span } => (rng.gen::<f64>() - 0.5) * span,
            };
            if m != 0.0 {
                return m;
            }
        }
    }
}

#[derive(Resource, Clone)]
pub struct SimSettings {
    pub body_count: usize,
    pub gravitational_constant: f64,
    pub max_force: f64,
    pub force_profile: ForceProfile,
    pub friction_fraction: f64,
    pub time_scale: f64,
    pub control_accel: f64,
    pub screen_size: Vec2,
    pub position_scaling_factor: f64,
    pub target_hz: f64,
    pub mass_distribution: MassDistribution,
    pub balance_signs: bool,
    pub seed: Option<u64>,
    pub show_help: bool,
    pub verbose: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        let screen_size = Vec2::new(1920.0, 1080.0);
        Self {
            body_count: 50,
            gravitational_constant: 0.01,
            max_force: 100.0,
            force_profile: ForceProfile::InverseDistance,
            friction_fraction: 0.3,
            time_scale: 1.0 / 60.0,
            control_accel: 10.0,
            screen_size,
            // pixels per unit of position
            position_scaling_factor: screen_size.min_element() as f64 / 5.0,
            target_hz: 60.0,
            mass_distribution: MassDistribution::Positive { max: 5.0 },
            balance_signs: false,
            seed: None,
            show_help: true,
            verbose: false,
        }
    }
}

impl SimSettings {
    pub fn force_law(&self) -> ForceLaw {
        ForceLaw::new(self.gravitational_constant, self.max_force, self.force_profile)
    }

    pub fn tunables(&self) -> Tunables {
        Tunables {
            friction_fraction: self.friction_fraction,
            time_scale: self.time_scale,
            position_scaling_factor: self.position_scaling_factor,
        }
    }
}

/// Parameters the player can change while the simulation runs. Any value is
/// accepted, including zero and negatives.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tunables {
    pub friction_fraction: f64,
    pub time_scale: f64,
    pub position_scaling_factor: f64,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Body {
    pub position: DVec2,
    pub velocity: DVec2,
    mass: f64,
    radius: u32,
    color: Color,
}

impl Body {
    pub fn new(position: DVec2, velocity: DVec2, mass: f64) -> Result<Self, SimError> {
        if mass == 0.0 || !mass.is_finite() {
            return Err(SimError::InvalidMass(mass));
        }
        Ok(Self {
            position,
            velocity,
            mass,
            radius: (3.0 * mass.abs().cbrt()).floor() as u32,
            color: if mass > 0.0 {
                POSITIVE_COLOR
            } else {
                NEGATIVE_COLOR
            },
        })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Sum of the forces every body in `others` exerts on this one.
    pub fn total_force<'a>(
        &self,
        others: impl IntoIterator<Item = &'a Body>,
        law: &ForceLaw,
    ) -> DVec2 {
        others.into_iter().fold(DVec2::ZERO, |acc, other| {
            let dist = distance(self.position, other.position);
            acc + law.attraction(dist, self.mass, other.mass, other.position - self.position)
        })
    }

    /// Divides by `|mass|`: a negative-mass body still moves along the net
    /// force instead of against it.
    pub fn accelerate(&mut self, force: DVec2, time_scale: f64) {
        self.velocity += time_scale * force / self.mass.abs();
    }

    pub fn accumulate_force<'a>(
        &mut self,
        others: impl IntoIterator<Item = &'a Body>,
        law: &ForceLaw,
        time_scale: f64,
    ) {
        let force = self.total_force(others, law);
        self.accelerate(force, time_scale);
    }

    pub fn evolve_position(&mut self, friction_fraction: f64, time_scale: f64) {
        self.velocity *= 1.0 - friction_fraction * time_scale;
        self.position += time_scale * self.velocity;
    }
}

/// Random population recipe. Position and velocity components are drawn
/// independently from `component`.
pub struct Population<M, C> {
    pub count: usize,
    pub mass: M,
    pub component: C,
    pub balance_signs: bool,
}

impl<M: Distribution<f64>, C: Distribution<f64>> Population<M, C> {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Body>, SimError> {
        (0..self.count)
            .map(|i| {
                let position = DVec2::new(self.component.sample(rng), self.component.sample(rng));
                let velocity = DVec2::new(self.component.sample(rng), self.component.sample(rng));
                let mut mass = self.mass.sample(rng);
                if self.balance_signs {
                    mass = if i < self.count / 2 {
                        mass.abs()
                    } else {
                        -mass.abs()
                    };
                }
                Body::new(position, velocity, mass)
            })
            .collect()
    }
}

/// The whole simulated population plus its live tunables.
///
/// Bodies are sorted by descending mass once at construction; index 0 is the
/// camera anchor and the player-controlled body for the rest of the run.
#[derive(Resource, Clone, Debug)]
pub struct SimWorld {
    bodies: Vec<Body>,
    pub tunables: Tunables,
    force_law: ForceLaw,
    ticks: u64,
}

impl SimWorld {
    pub fn new(mut bodies: Vec<Body>, tunables: Tunables, force_law: ForceLaw) -> Self {
        bodies.sort_by(|a, b| b.mass.total_cmp(&a.mass));
        Self {
            bodies,
            tunables,
            force_law,
            ticks: 0,
        }
    }

    pub fn generate<R: Rng + ?Sized>(settings: &SimSettings, rng: &mut R) -> Result<Self, SimError> {
        settings.mass_distribution.validate()?;
        let population = Population {
            count: settings.body_count,
            mass: settings.mass_distribution,
            component: Uniform::new(0.0, 1.0),
            balance_signs: settings.balance_signs,
        };
        let bodies = population.sample(rng)?;
        Ok(Self::new(bodies, settings.tunables(), settings.force_law()))
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn controlled(&self) -> Option<&Body> {
        self.bodies.first()
    }

    pub fn controlled_mut(&mut self) -> Option<&mut Body> {
        self.bodies.first_mut()
    }

    pub fn force_law(&self) -> &ForceLaw {
        &self.force_law
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Σ m·v over the population.
    pub fn momentum(&self) -> DVec2 {
        self.bodies
            .iter()
            .fold(DVec2::ZERO, |acc, b| acc + b.mass * b.velocity)
    }

    pub fn freeze(&mut self) {
        for body in &mut self.bodies {
            body.velocity = DVec2::ZERO;
        }
    }

    /// Advance every body by one tick.
    ///
    /// All forces are taken from the positions at the start of the tick;
    /// no position moves until every velocity has been updated.
    pub fn step(&mut self) {
        let Tunables {
            friction_fraction,
            time_scale,
            ..
        } = self.tunables;

        let snapshot = self.bodies.clone();
        for (i, body) in self.bodies.iter_mut().enumerate() {
            let others = snapshot
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| other);
            body.accumulate_force(others, &self.force_law, time_scale);
        }
        for body in &mut self.bodies {
            body.evolve_position(friction_fraction, time_scale);
        }

        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn still_tunables() -> Tunables {
        Tunables {
            friction_fraction: 0.0,
            time_scale: 1.0,
            position_scaling_factor: 1.0,
        }
    }

    fn pair(m1: f64, m2: f64) -> SimWorld {
        let bodies = vec![
            Body::new(DVec2::ZERO, DVec2::ZERO, m1).unwrap(),
            Body::new(DVec2::new(1.0, 0.0), DVec2::ZERO, m2).unwrap(),
        ];
        SimWorld::new(bodies, still_tunables(), ForceLaw::default())
    }

    #[test]
    fn rejects_zero_and_non_finite_mass() {
        assert_eq!(
            Body::new(DVec2::ZERO, DVec2::ZERO, 0.0),
            Err(SimError::InvalidMass(0.0))
        );
        assert!(Body::new(DVec2::ZERO, DVec2::ZERO, f64::NAN).is_err());
        assert!(Body::new(DVec2::ZERO, DVec2::ZERO, f64::INFINITY).is_err());
    }

    #[test]
    fn radius_and_color_follow_mass() {
        let heavy = Body::new(DVec2::ZERO, DVec2::ZERO, 9.0).unwrap();
        assert_eq!(heavy.radius(), 6);
        assert_eq!(heavy.color(), POSITIVE_COLOR);

        let light = Body::new(DVec2::ZERO, DVec2::ZERO, -0.5).unwrap();
        assert_eq!(light.radius(), 2);
        assert_eq!(light.color(), NEGATIVE_COLOR);

        assert_eq!(Body::new(DVec2::ZERO, DVec2::ZERO, 0.01).unwrap().radius(), 0);
    }

    #[test]
    fn two_equal_bodies_pull_together() {
        let mut world = pair(10.0, 10.0);
        let law = *world.force_law();
        let [a, b] = [&world.bodies()[0], &world.bodies()[1]];
        assert!((a.total_force([b], &law) - DVec2::new(1.0, 0.0)).length() < 1e-12);

        world.step();

        let a = &world.bodies()[0];
        let b = &world.bodies()[1];
        // force 1.0 divided by |mass| 10
        assert!((a.velocity - DVec2::new(0.1, 0.0)).length() < 1e-12);
        assert!((b.velocity - DVec2::new(-0.1, 0.0)).length() < 1e-12);
        assert!((a.position - DVec2::new(0.1, 0.0)).length() < 1e-12);
        assert!((b.position - DVec2::new(0.9, 0.0)).length() < 1e-12);
    }

    #[test]
    fn negative_mass_moves_along_net_force() {
        let mut world = pair(10.0, -10.0);
        world.step();
        // sorted: the positive body first
        let pos = &world.bodies()[0];
        let neg = &world.bodies()[1];
        assert!(pos.velocity.x < 0.0, "pushed away from the negative body");
        assert!(neg.velocity.x > 0.0, "pushed away from the positive body");
    }

    #[test]
    fn lone_body_only_feels_friction() {
        let start = DVec2::new(0.25, 0.75);
        let body = Body::new(start, DVec2::ZERO, 5.0).unwrap();
        let law = ForceLaw::default();
        assert_eq!(body.total_force(std::iter::empty(), &law), DVec2::ZERO);

        let tunables = Tunables {
            friction_fraction: 0.3,
            time_scale: 1.0 / 60.0,
            position_scaling_factor: 1.0,
        };
        let mut world = SimWorld::new(vec![body], tunables, law);
        for _ in 0..10 {
            world.step();
        }
        assert_eq!(world.bodies()[0].velocity, DVec2::ZERO);
        assert_eq!(world.bodies()[0].position, start);

        let moving = Body::new(start, DVec2::new(1.0, 0.0), 5.0).unwrap();
        let mut world = SimWorld::new(vec![moving], tunables, law);
        world.step();
        let damping = 1.0 - 0.3 / 60.0;
        assert!((world.bodies()[0].velocity.x - damping).abs() < 1e-12);
    }

    #[test]
    fn zero_time_scale_freezes_positions() {
        let mut rng = StdRng::seed_from_u64(3);
        let settings = SimSettings {
            body_count: 12,
            ..default()
        };
        let mut world = SimWorld::generate(&settings, &mut rng).unwrap();
        world.tunables.time_scale = 0.0;
        let before: Vec<DVec2> = world.bodies().iter().map(|b| b.position).collect();

        world.step();

        let after: Vec<DVec2> = world.bodies().iter().map(|b| b.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn momentum_does_not_drift_without_friction() {
        let bodies = vec![
            Body::new(DVec2::ZERO, DVec2::new(0.0, 0.3), 3.0).unwrap(),
            Body::new(DVec2::new(1.0, 0.0), DVec2::new(0.0, -0.45), 2.0).unwrap(),
        ];
        let tunables = Tunables {
            friction_fraction: 0.0,
            time_scale: 1.0 / 60.0,
            position_scaling_factor: 1.0,
        };
        let mut world = SimWorld::new(bodies, tunables, ForceLaw::default());
        let initial = world.momentum();

        for _ in 0..1000 {
            world.step();
        }

        assert!((world.momentum() - initial).length() < 1e-9);
        assert_eq!(world.tick_count(), 1000);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let settings = SimSettings {
            body_count: 20,
            seed: Some(42),
            ..default()
        };
        let run = || {
            let mut rng = StdRng::seed_from_u64(42);
            let mut world = SimWorld::generate(&settings, &mut rng).unwrap();
            for _ in 0..200 {
                world.step();
            }
            world.bodies().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn population_is_sorted_heaviest_first() {
        let mut rng = StdRng::seed_from_u64(9);
        let world = SimWorld::generate(&SimSettings::default(), &mut rng).unwrap();
        assert_eq!(world.bodies().len(), 50);
        assert!(world
            .bodies()
            .windows(2)
            .all(|w| w[0].mass() >= w[1].mass()));
        let heaviest = world.bodies().iter().map(|b| b.mass()).fold(f64::MIN, f64::max);
        assert_eq!(world.controlled().map(Body::mass), Some(heaviest));
    }

    #[test]
    fn balanced_population_splits_signs() {
        let population = Population {
            count: 10,
            mass: MassDistribution::Signed { span: 10.0 },
            component: Uniform::new(0.0, 1.0),
            balance_signs: true,
        };
        let bodies = population.sample(&mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(bodies.iter().filter(|b| b.mass() > 0.0).count(), 5);
        assert_eq!(bodies.iter().filter(|b| b.mass() < 0.0).count(), 5);
        assert!(bodies
            .iter()
            .all(|b| (0.0..1.0).contains(&b.position.x) && (0.0..1.0).contains(&b.velocity.y)));
    }

    #[test]
    fn mass_distributions_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let positive = MassDistribution::Positive { max: 5.0 };
        let signed = MassDistribution::Signed { span: 10.0 };
        for _ in 0..1000 {
            let m = positive.sample(&mut rng);
            assert!(m > 0.0 && m < 5.0);
            let s = signed.sample(&mut rng);
            assert!(s != 0.0 && s.abs() <= 5.0);
        }
    }

    #[test]
    fn zero_width_mass_distribution_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        for dist in [
            MassDistribution::Positive { max: 0.0 },
            MassDistribution::Signed { span: 0.0 },
            MassDistribution::Positive { max: f64::NAN },
        ] {
            let settings = SimSettings {
                mass_distribution: dist,
                ..default()
            };
            assert!(matches!(
                SimWorld::generate(&settings, &mut rng),
                Err(SimError::DegenerateMassDistribution(_))
            ));
        }
        assert!(MassDistribution::Signed { span: 10.0 }.validate().is_ok());
    }

    #[test]
    fn empty_world_steps_quietly() {
        let mut world = SimWorld::new(Vec::new(), still_tunables(), ForceLaw::default());
        world.step();
        assert!(world.controlled().is_none());
        assert_eq!(world.momentum(), DVec2::ZERO);
    }
}
