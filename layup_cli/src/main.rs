//! # Layup CLI Application
//!
//! Terminal front end for the laminate engine.
//!
//! ```text
//! layup_cli                     report on the built-in demo bat
//! layup_cli design.layup        report on every root of a saved design
//! layup_cli --save demo.layup   write the demo bat to a design file
//! ```
//!
//! Set `RUST_LOG=debug` to trace laminate assembly.

use std::env;
use std::f64::consts::PI;
use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;

use log::info;

use layup_core::document::{DesignDocument, Entity};
use layup_core::file_io::{load_design, save_design};
use layup_core::layers::{Lamina, Laminate, Layer, LayerProperties, Orientation};
use layup_core::materials::{library, Material};
use layup_core::settings::AnalysisSettings;
use layup_core::tube::{MoldedTube, PlySpec, PlySpecConfig, Profile};
use layup_core::units::{Inches, Meters};
use layup_core::CalcResult;

const KG_PER_OZ: f64 = 0.028_349_523_125;

fn inches(value: f64) -> f64 {
    Meters::from(Inches(value)).0
}

fn to_inches(value: f64) -> f64 {
    Inches::from(Meters(value)).0
}

/// A 33" bat: a ±30° carbon wall over the whole length plus three more
/// walls in the barrel.
fn demo_bat() -> CalcResult<MoldedTube> {
    let fiber = Rc::new(library::material("carbon-sm")?);
    let resin = Rc::new(library::material("epoxy")?);

    let ud = Rc::new(Layer::Lamina(Lamina::fiber_resin("UD 150", fiber, None, 0.150, 0.55, false)?));
    let pair = Laminate::with_plies(
        "±30",
        [(Rc::clone(&ud), 30.0, Orientation::Normal), (ud, -30.0, Orientation::Normal)],
    )?;
    let mut wall = Laminate::new("4");
    wall.add_repeated(Rc::new(Layer::Laminate(pair)), 0.0, Orientation::Normal, 4)?;
    let wall = Rc::new(Layer::Laminate(wall));

    let (handle_od, barrel_od) = (inches(0.95), inches(2.625));
    let profile = Profile::from_pairs(&[
        (0.0, handle_od),
        (inches(12.0), handle_od),
        (inches(24.0), barrel_od),
        (inches(33.0), barrel_od),
    ])?;
    let mut bat = MoldedTube::new("Demo bat", profile, resin);

    bat.add_ply(PlySpec::build(PlySpecConfig {
        layer: Some(Rc::clone(&wall)),
        start: Some(0.0),
        end: Some(inches(33.5)),
        taper_start: Some(inches(12.0)),
        taper_end: Some(inches(24.0)),
        width_at_start: Some(PI * handle_od),
        width_at_end: Some(PI * barrel_od),
        ..Default::default()
    })?);
    for _ in 0..3 {
        bat.add_ply(PlySpec::uniform(Rc::clone(&wall), inches(22.0), inches(33.5), PI * barrel_od, 0.0)?);
    }
    Ok(bat)
}

fn print_material(material: &Material) {
    println!("Material: {} ({})", material.name(), material.kind());
    println!("  density = {:.0} kg/m³", material.density());
    println!(
        "  E1 = {:.2} GPa  E2 = {:.2} GPa  G12 = {:.2} GPa  PR12 = {:.3}",
        material.e1() / 1e9,
        material.e2() / 1e9,
        material.g12() / 1e9,
        material.pr12()
    );
}

fn print_layer_properties(name: &str, props: &LayerProperties) {
    println!("Layer: {} ({} plies)", name, props.ply_count);
    println!("  t    = {:.3} mm", props.thickness * 1e3);
    println!("  Ex   = {:.2} GPa   Ey  = {:.2} GPa   Gxy = {:.2} GPa", props.ex / 1e9, props.ey / 1e9, props.gxy / 1e9);
    println!("  PRxy = {:.3}      PRyx = {:.3}", props.prxy, props.pryx);
    println!("  Exf  = {:.2} GPa   Eyf = {:.2} GPa", props.exf / 1e9, props.eyf / 1e9);
    println!("  NAx  = {:.3} mm    NAy = {:.3} mm", props.na_x * 1e3, props.na_y * 1e3);
    println!("  ρ    = {:.0} kg/m³  vf = {:.3}", props.density, props.vf);
}

fn print_tube(tube: &MoldedTube) -> CalcResult<()> {
    let (x0, x1) = (tube.x_min(), tube.x_max());
    println!("Tube: {} ({} ply specs)", tube.name(), tube.plies().len());
    println!();
    println!("  {:>7}  {:>7}  {:>7}  {:>6}  {:>10}  {:>9}  {:>8}", "x in", "OD in", "t mm", "plies", "EI N·m²", "w g/m", "BC lbf");

    let samples = 12;
    for i in 0..samples {
        let x = x0 + (x1 - x0) * i as f64 / samples as f64;
        let s = tube.section_properties(x)?;
        println!(
            "  {:>7.2}  {:>7.3}  {:>7.3}  {:>6}  {:>10.1}  {:>9.1}  {:>8.0}",
            to_inches(x),
            to_inches(s.od),
            s.thickness * 1e3,
            s.ply_count,
            s.bending_stiffness,
            s.weight_per_length * 1e3,
            s.barrel_compression
        );
    }

    let weight = tube.weight(x0, x1)?;
    println!();
    println!("  weight = {:.1} g ({:.2} oz)", weight * 1e3, weight / KG_PER_OZ);
    if weight > 0.0 {
        println!("  COG    = {:.2} in from x_min", to_inches(tube.cog(x0, x1)? - x0));
        println!("  MOI    = {:.0} kg·cm² about x_min", tube.moi(x0, x1, x0)? * 1e4);
    }
    Ok(())
}

fn report(entity: &Entity) -> CalcResult<()> {
    match entity {
        Entity::Material(m) => print_material(m),
        Entity::Layer(l) => print_layer_properties(l.name(), &l.properties()?),
        Entity::Tube(t) => print_tube(t)?,
    }
    println!();
    Ok(())
}

fn run(args: &[String]) -> CalcResult<()> {
    match args {
        [] => {
            let bat = demo_bat()?;
            print_tube(&bat)?;

            let barrel = bat.laminate_at(inches(28.0))?;
            let props = barrel.properties()?;
            println!();
            print_layer_properties(barrel.name(), &props);
            println!();
            println!("JSON Output:");
            println!("{}", serde_json::to_string_pretty(&props)?);
        }
        [flag, path] if flag == "--save" => {
            let bat = Rc::new(demo_bat()?);
            let name = bat.name().to_string();
            let doc = DesignDocument::encode(name, "layup_cli", AnalysisSettings::default(), &[Entity::Tube(bat)])?;
            save_design(&doc, Path::new(path))?;
            println!("Saved {} objects to {}", doc.object_count(), path);
        }
        [path] => {
            let doc = load_design(Path::new(path))?;
            info!("design '{}' by {}", doc.meta.name, doc.meta.designer);
            for entity in doc.decode()? {
                report(&entity)?;
            }
        }
        _ => {
            eprintln!("usage: layup_cli [design.layup | --save design.layup]");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    println!("Layup CLI - Composite Laminate Calculator");
    println!("=========================================");
    println!();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}
