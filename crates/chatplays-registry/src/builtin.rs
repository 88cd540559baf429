//! Descriptors declared for modules the registry knows up front.
//!
//! Rows marked built in have handlers constructed from the built-in table;
//! the rest are introspected but carry tuned scores and capability flags.

use crate::domain::descriptor::{ModuleDescriptor, StatusLight};

struct Row {
    id: &'static str,
    name: Option<&'static str>,
    score: i32,
    built_in: bool,
    dtrt: bool,
}

const fn built_in(id: &'static str, name: &'static str, score: i32) -> Row {
    Row {
        id,
        name: Some(name),
        score,
        built_in: true,
        dtrt: false,
    }
}

const fn modded(id: &'static str, name: Option<&'static str>, score: i32, dtrt: bool) -> Row {
    Row {
        id,
        name,
        score,
        built_in: false,
        dtrt,
    }
}

const ROWS: &[Row] = &[
    // Vanilla
    built_in("WireSetComponentSolver", "Wires", 1),
    built_in("ButtonComponentSolver", "Big Button", 1),
    built_in("ButtonComponentModifiedSolver", "Big Button", 4),
    built_in("WireSequenceComponentSolver", "Wire Sequence", 4),
    built_in("WhosOnFirstComponentSolver", "Who's on First", 4),
    built_in("VennWireComponentSolver", "Complicated Wires", 3),
    built_in("SimonComponentSolver", "Simon Says", 3),
    built_in("PasswordComponentSolver", "Password", 2),
    built_in("NeedyVentComponentSolver", "Needy Vent Gas", 5),
    built_in("NeedyKnobComponentSolver", "Needy Knob", 5),
    built_in("NeedyDischargeComponentSolver", "Needy Capacitor", 5),
    built_in("MorseCodeComponentSolver", "Morse Code", 3),
    built_in("MemoryComponentSolver", "Memory", 4),
    built_in("KeypadComponentSolver", "Keypad", 1),
    built_in("InvisibleWallsComponentSolver", "Maze", 2),
    // Modded, with built-in handlers
    built_in("murder", "Murder", 10),
    built_in("SeaShells", "Sea Shells", 7),
    built_in("shapeshift", "Shape Shift", 8),
    built_in("ThirdBase", "Third Base", 6),
    built_in("CrazyTalk", "Crazy Talk", 3),
    built_in("CryptModule", "Cryptography", 9),
    built_in("ForeignExchangeRates", "Foreign Exchange Rates", 6),
    built_in("Listening", "Listening", 6),
    built_in("OrientationCube", "Orientation Cube", 10),
    built_in("Probing", "Probing", 8),
    built_in("TurnTheKey", "Turn The Key", 6),
    built_in("TurnTheKeyAdvanced", "Turn The Keys", 15),
    built_in("TwoBits", "Two Bits", 8),
    built_in("resistors", "Resistors", 6),
    built_in("switchModule", "Switches", 3),
    built_in("errorCodes", "Error Codes", 3),
    // Modded, introspected
    modded("Color Generator", Some("Color Generator"), 5, true),
    modded("ExtendedPassword", Some("Extended Password"), 7, true),
    modded("MazeV2", Some("Plumbing"), 15, true),
    modded("SimonScreamsModule", None, 10, true),
    modded("bases", None, 9, true),
    modded("boggle", None, 5, true),
    modded("calendar", None, 6, true),
    modded("characterShift", None, 12, true),
    modded("complexKeypad", None, 3, true),
    modded("doubleColor", None, 2, true),
    modded("equations", None, 9, true),
    modded("subways", None, 5, true),
    modded("timeKeeper", None, 7, true),
    modded("CruelPianoKeys", None, 15, false),
    modded("PianoKeys", None, 6, false),
    modded("Tangrams", None, 7, true),
    modded("greekCalculus", None, 10, false),
    modded("BigCircle", None, 12, true),
    modded("GameOfLifeCruel", None, 20, true),
];

/// Builds the declared descriptor set.
#[must_use]
pub fn descriptors() -> Vec<ModuleDescriptor> {
    ROWS.iter()
        .map(|row| {
            let mut descriptor = ModuleDescriptor {
                display_name: row.name.map(str::to_owned),
                score: row.score,
                built_in: row.built_in,
                does_the_right_thing: row.dtrt,
                ..ModuleDescriptor::new(row.id)
            };
            customize(&mut descriptor);
            descriptor
        })
        .collect()
}

fn customize(descriptor: &mut ModuleDescriptor) {
    match descriptor.module_id.as_str() {
        "Listening" => {
            descriptor.status_light = StatusLight {
                left: true,
                bottom: false,
            };
            descriptor.status_light_override = true;
        }
        "doubleColor" => {
            descriptor.status_light = StatusLight {
                left: true,
                bottom: true,
            };
            descriptor.status_light_override = true;
        }
        "timeKeeper" => descriptor.camera_pinning_always_allowed = true,
        "CruelPianoKeys" | "PianoKeys" => {
            descriptor.help_text =
                Some("Submit your answer with !{0} press Bb Bb Bb Bb Gb Ab Bb Ab Bb.".to_owned());
        }
        _ => {}
    }
}
