//! Elevator assignment: picks which of four cars should answer a call from
//! the caller's floor, destination, passenger count, car load and the
//! direction of travel.
//!
//! The crisp output lies on `0..=4`; values near `n - 1` favour car `n`.

use tracing::debug;

use crate::error::Result;
use crate::system::ControlSystem;
use crate::terms::MembershipFunction;
use crate::universe::Universe;

pub const CURRENT_FLOOR: &str = "current_floor";
pub const DESTINATION_FLOOR: &str = "destination_floor";
pub const NUMBER_OF_PASSENGERS: &str = "number_of_passengers";
pub const ELEVATOR_LOAD: &str = "elevator_load";
pub const DIRECTION_OF_TRAVEL: &str = "direction_of_travel";
pub const ELEVATOR_ASSIGNMENT: &str = "elevator_assignment";

/// Direction of travel as encoded on the `direction_of_travel` input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Idle,
    Up,
    Down,
}

impl From<Direction> for f64 {
    fn from(direction: Direction) -> f64 {
        match direction {
            Direction::Idle => 0.,
            Direction::Up => 1.,
            Direction::Down => 2.,
        }
    }
}

/// Builds the four-rule elevator assignment system.
pub fn control_system() -> Result<ControlSystem> {
    let mut builder = ControlSystem::builder();

    let current_floor = builder.add_input(CURRENT_FLOOR, Universe::with_step(1. ..=18., 1.)?)?;
    let destination_floor = builder.add_input(DESTINATION_FLOOR, Universe::with_step(1. ..=18., 1.)?)?;
    let passengers = builder.add_input(NUMBER_OF_PASSENGERS, Universe::with_step(0. ..=20., 1.)?)?;
    let load = builder.add_input(ELEVATOR_LOAD, Universe::with_step(0. ..=100., 1.)?)?;
    let direction = builder.add_input(DIRECTION_OF_TRAVEL, Universe::with_step(0. ..=2., 1.)?)?;
    let assignment = builder.add_output(ELEVATOR_ASSIGNMENT, Universe::with_step(0. ..=4., 1.)?)?;

    for floor in [current_floor, destination_floor] {
        builder.define_term(floor, "low", MembershipFunction::triangular(1., 1., 9.)?)?;
        builder.define_term(floor, "medium", MembershipFunction::triangular(5., 9., 13.)?)?;
        builder.define_term(floor, "high", MembershipFunction::triangular(9., 18., 18.)?)?;
    }

    builder.define_term(passengers, "few", MembershipFunction::triangular(0., 0., 10.)?)?;
    builder.define_term(passengers, "moderate", MembershipFunction::triangular(5., 10., 15.)?)?;
    builder.define_term(passengers, "many", MembershipFunction::triangular(10., 20., 20.)?)?;

    builder.define_term(load, "light", MembershipFunction::triangular(0., 0., 50.)?)?;
    builder.define_term(load, "moderate", MembershipFunction::triangular(25., 50., 75.)?)?;
    builder.define_term(load, "heavy", MembershipFunction::triangular(50., 100., 100.)?)?;

    builder.define_term(direction, "idle", MembershipFunction::triangular(0., 0., 0.)?)?;
    builder.define_term(direction, "up", MembershipFunction::triangular(0., 1., 2.)?)?;
    builder.define_term(direction, "down", MembershipFunction::triangular(1., 2., 2.)?)?;

    for (car, peak) in (1..=4).zip(0u8..) {
        let peak = f64::from(peak);

        builder.define_term(
            assignment,
            format!("elevator_{car}"),
            MembershipFunction::triangular(peak, peak, peak + 1.)?,
        )?;
    }

    let idle = builder.is(direction, "idle")?;

    let premise = builder.is(passengers, "many")? & builder.is(load, "light")? & idle.clone();
    let car = builder.then(assignment, "elevator_1")?;
    builder.rule(premise, [car])?;

    let premise = builder.is(current_floor, "low")? & builder.is(destination_floor, "high")? & idle.clone();
    let car = builder.then(assignment, "elevator_2")?;
    builder.rule(premise, [car])?;

    let premise = builder.is(current_floor, "high")? & builder.is(destination_floor, "low")? & idle;
    let car = builder.then(assignment, "elevator_3")?;
    builder.rule(premise, [car])?;

    let premise = builder.is(passengers, "few")? & builder.is(load, "heavy")?;
    let car = builder.then(assignment, "elevator_4")?;
    builder.rule(premise, [car])?;

    builder.build()
}

/// The five crisp readings behind one assignment request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Request {
    pub current_floor: f64,
    pub destination_floor: f64,
    pub number_of_passengers: f64,
    pub elevator_load: f64,
    pub direction_of_travel: Direction,
}

impl Request {
    /// Evaluates the request against `system` with a fresh simulation and
    /// returns the crisp assignment.
    pub fn assign(&self, system: &ControlSystem) -> Result<f64> {
        let mut sim = system.simulation();

        sim.set_input(CURRENT_FLOOR, self.current_floor)?;
        sim.set_input(DESTINATION_FLOOR, self.destination_floor)?;
        sim.set_input(NUMBER_OF_PASSENGERS, self.number_of_passengers)?;
        sim.set_input(ELEVATOR_LOAD, self.elevator_load)?;
        sim.set_input(DIRECTION_OF_TRAVEL, self.direction_of_travel.into())?;
        sim.compute()?;

        let assigned = sim.get_output(ELEVATOR_ASSIGNMENT)?;

        debug!(request = ?self, assigned, "assigned elevator");

        Ok(assigned)
    }
}

#[cfg(test)]
fn assert_assigned(request: Request, expected: f64) {
    let system = control_system().unwrap();
    let assigned = request.assign(&system).unwrap();

    assert!((assigned - expected).abs() < 1e-9, "assigned {assigned}, expected {expected}");
}

#[test]
fn test_low_to_high_while_idle() {
    let request = Request {
        current_floor: 2.,
        destination_floor: 17.,
        number_of_passengers: 3.,
        elevator_load: 20.,
        direction_of_travel: Direction::Idle,
    };

    assert_assigned(request, 1.);
}

#[test]
fn test_few_passengers_heavy_load() {
    let request = Request {
        current_floor: 9.,
        destination_floor: 9.,
        number_of_passengers: 2.,
        elevator_load: 90.,
        direction_of_travel: Direction::Up,
    };

    assert_assigned(request, 3.);
}

#[test]
fn test_no_rule_fires_falls_back_to_midpoint() {
    let request = Request {
        current_floor: 9.,
        destination_floor: 9.,
        number_of_passengers: 5.,
        elevator_load: 50.,
        direction_of_travel: Direction::Up,
    };

    assert_assigned(request, 2.);
}
