
extern crate cgmath;
extern crate env_logger;
extern crate velum;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::io;

use cgmath::Vector3;
use velum::{Cloth, PointOverride, StepParams};

const EDGE_COUNT: usize = 40;
const MAX_EDGE_WIDTH: f32 = 1.0;
const PARTICLE_WEIGHT: f32 = 0.001;
const TIMESTEP: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init().unwrap();

    let mut cloth = Cloth::new(EDGE_COUNT, MAX_EDGE_WIDTH, PARTICLE_WEIGHT).unwrap();
    let params = StepParams::default();

    // let the cloth drape off its two anchored corners for two seconds
    for frame in 0..120 {
        cloth.step(TIMESTEP, &params).unwrap();
        if frame % 30 == 0 {
            report(&cloth, frame);
        }
    }

    // grab the top-right point and sweep it sideways, as a pointer would
    let grabbed = EDGE_COUNT - 1;
    for _ in 0..60 {
        let delta = Vector3::new(0.005f32, 0.0, 0.0);
        let position = cloth.positions()[grabbed] + delta;
        cloth.override_point(grabbed, PointOverride {
            position: Some(position),
            velocity: Some(delta / TIMESTEP),
            fixed: Some(true),
        });
        cloth.step(TIMESTEP, &params).unwrap();
    }
    cloth.override_point(grabbed, PointOverride {
        fixed: Some(false),
        ..Default::default()
    });

    // let it settle again
    for frame in 0..120 {
        cloth.step(TIMESTEP, &params).unwrap();
        if frame % 30 == 0 {
            report(&cloth, 180 + frame);
        }
    }

    export_obj(&cloth, "cloth_drop.obj").unwrap();
    println!("wrote cloth_drop.obj");
}

fn report(cloth: &Cloth<f32>, frame: usize) {
    let lowest = cloth.positions()
        .iter()
        .map(|position| position.y)
        .fold(std::f32::INFINITY, f32::min);
    println!("frame {:4}: lowest point y = {:.4}", frame, lowest);
}

fn export_obj(cloth: &Cloth<f32>, path: &str) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for position in cloth.positions() {
        writeln!(out, "v {} {} {}", position.x, position.y, position.z)?;
    }
    for triangle in cloth.triangle_indices().chunks(3) {
        writeln!(out, "f {} {} {}", triangle[0] + 1, triangle[1] + 1, triangle[2] + 1)?;
    }
    Ok(())
}
