#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;
extern crate atty;
extern crate studiomdl;
extern crate termcolor;

mod logger;

use clap::ArgMatches;
use std::fs::File;
use std::io::BufReader;
use std::process::exit;
use studiomdl::errors::Result;
use studiomdl::studio::{self, StudioFile};

fn main() {
    let app = clap_app!(studiomdl =>
        (@setting SubcommandRequiredElseHelp)
        (version: crate_version!())
        (about: "Studio model (.mdl) inspector")
        (@arg VERBOSE: -v ... "Log more (-v debug, -vv trace)")
        (@subcommand info =>
            (about: "Print the contents of a model")
            (alias: "i")
            (@arg INPUT: +required "MDL file")
        )
        (@subcommand crc =>
            (about: "Print the CRC-32 of a model")
            (@arg INPUT: +required "MDL file")
        )
        (@subcommand probe =>
            (about: "Check whether a file is a studio model")
            (@arg INPUT: +required "Any file")
        )
    );
    let matches = app.get_matches();

    logger::init(logger::level_for_verbosity(matches.occurrences_of("VERBOSE")));

    let res = match matches.subcommand() {
        ("info", Some(m)) => info(m),
        ("crc", Some(m)) => crc(m),
        ("probe", Some(m)) => probe(m),
        _ => Ok(()),
    };

    if let Err(e) = res {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        exit(1);
    }
}

fn open_input(m: &ArgMatches) -> Result<BufReader<File>> {
    let path = m.value_of_os("INPUT").unwrap_or_default();
    debug!("opening {:?}", path);
    Ok(BufReader::new(File::open(path)?))
}

fn crc(m: &ArgMatches) -> Result<()> {
    let mut f = open_input(m)?;
    let crc = studio::compute_crc_stream(&mut f)?;
    println!("{:08x}", crc);
    Ok(())
}

fn probe(m: &ArgMatches) -> Result<()> {
    let mut f = open_input(m)?;
    if studio::is_studio_stream(&mut f)? {
        println!("studio model");
    } else {
        println!("not a studio model");
    }
    Ok(())
}

fn info(m: &ArgMatches) -> Result<()> {
    let mut f = open_input(m)?;
    let file = match studio::read_studio_stream(&mut f)? {
        Some(file) => file,
        None => return Err("not a studio model (expected the file to start with IDST)".into()),
    };
    print_info(&file);
    Ok(())
}

fn print_info(file: &StudioFile) {
    println!("Model: {}", file.name);
    let eye = file.eye_position;
    println!("  Eye Position: ({}, {}, {})", eye.x, eye.y, eye.z);
    println!("  Flags: {:#x}", file.flags);

    println!("  Bones ({} total):", file.bones.len());
    for (i, bone) in file.bones.iter().enumerate() {
        match bone.parent {
            Some(p) => println!("    Bone {}: {} (parent {})", i, bone.name, p),
            None => println!("    Bone {}: {} (root)", i, bone.name),
        }
    }

    println!("  Bone Controllers ({} total):", file.bone_controllers.len());
    for ctl in &file.bone_controllers {
        println!("    Index {}: {:?} [{}, {}] on bone {}",
            ctl.index, ctl.motion_type, ctl.start, ctl.end,
            ctl.bone.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string()),
        );
    }

    println!("  Sequences ({} total):", file.sequences.len());
    for (i, seq) in file.sequences.iter().enumerate() {
        let seq_info = studio::sequence_info(file, i);
        println!("    Sequence {}: {}", i, seq.label);
        println!("      Frames: {} at {} fps{}",
            seq.frame_count, seq.fps,
            if seq.is_looping() { " (looping)" } else { "" },
        );
        println!("      Frame Rate: {}, Ground Speed: {}",
            seq_info.frame_rate, seq_info.ground_speed);
        println!("      Events: {}, Blends: {}", seq.events.len(), seq.animations.len());
    }

    println!("  Body Parts ({} total):", file.body_parts.len());
    for (i, part) in file.body_parts.iter().enumerate() {
        println!("    Body Part {}: {} (base {})", i, part.name, part.base);
        for (j, model) in part.models.iter().enumerate() {
            let num_cmds: usize = model.meshes.iter().map(|m| m.commands().count()).sum();
            println!("      Sub-model {}: {} ({} meshes, {} verts, {} strips/fans)",
                j, model.name, model.meshes.len(), model.vertices.len(), num_cmds);
        }
    }

    println!("  Textures ({} total):", file.textures.len());
    for tex in &file.textures {
        println!("    {} ({}x{}, {:?})", tex.name, tex.width, tex.height, tex.flags);
    }
    println!("  Skin Families: {}", file.skin_families.len());
    println!("  Attachments: {}", file.attachments.len());
    println!("  Hitboxes: {}", file.hitboxes.len());
}
