//! Offline narrator built from fixed tables.
//!
//! Sector descriptions are assembled from per-kind phrase lists. Interactive
//! events and scan outcomes are drawn from small hand-written tables with
//! fixed effects, so a seeded narrator always tells the same story.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sso_core::{Coord, Effects, SectorKind};

use super::{
    EventOutcome, InteractiveEvent, NarrativeResult, Narrator, ScanOracle, ScanResult,
};

const fn fx(hull: i64, energy: i64, resources: i64, souls: i64) -> Effects {
    Effects {
        hull,
        energy,
        resources,
        souls,
    }
}

fn sector_openings(kind: SectorKind) -> &'static [&'static str] {
    match kind {
        SectorKind::Empty => &[
            "Silence stretches in every direction.",
            "The viewscreen shows nothing but distant, indifferent stars.",
            "Empty space, cold and patient.",
        ],
        SectorKind::StarSystem => &[
            "A young yellow star burns at the heart of this system.",
            "Twin suns circle each other, throwing long shadows across the hull.",
            "A red giant swells on the horizon, its planets scorched and silent.",
        ],
        SectorKind::Nebula => &[
            "Violet gas coils around the ship like smoke.",
            "The nebula glows from within, lit by stars still being born.",
            "Static crawls across every sensor as the cloud closes in.",
        ],
        SectorKind::AsteroidField => &[
            "Tumbling rocks the size of cities drift past the bow.",
            "The field glitters with ice and ore.",
            "Proximity alarms chirp as the pilot threads between boulders.",
        ],
        SectorKind::Anomaly => &[
            "Space folds strangely here; the stars are in the wrong places.",
            "Instruments disagree about what time it is.",
            "A hum rises through the deck plates, just below hearing.",
        ],
        SectorKind::BlackHole => &[
            "Light bends around a perfect, hungry darkness.",
            "The accretion disk screams in X-rays.",
            "Every clock aboard slows as the ship skirts the event horizon.",
        ],
    }
}

const SECTOR_CODAS: &[&str] = &[
    "The crew logs it and moves on.",
    "Somewhere below decks, a soul stirs in its vessel.",
    "The navigator marks the charts with a careful hand.",
    "No one speaks for a while.",
];

struct ChoiceTemplate {
    label: &'static str,
    success_percent: u32,
    success: (&'static str, Effects),
    failure: (&'static str, Effects),
}

struct EventTemplate {
    description: &'static str,
    choices: &'static [ChoiceTemplate],
}

const EVENTS: &[EventTemplate] = &[
    EventTemplate {
        description: "A derelict freighter drifts across your path, its cargo bay torn open.",
        choices: &[
            ChoiceTemplate {
                label: "Board the derelict",
                success_percent: 60,
                success: ("Your boarding party returns with crates of salvage.", fx(0, -10, 40, 0)),
                failure: (
                    "Automated defenses wake and rake your hull before you withdraw.",
                    fx(-20, -10, 0, 0),
                ),
            },
            ChoiceTemplate {
                label: "Scan from a distance",
                success_percent: 90,
                success: ("Long-range scans locate a drifting fuel cell.", fx(0, 15, 0, 0)),
                failure: (
                    "The wreck's reactor flares and your sensors go dark for a moment.",
                    fx(0, -5, 0, 0),
                ),
            },
            ChoiceTemplate {
                label: "Leave it be",
                success_percent: 100,
                success: ("You leave the dead to their rest.", fx(0, 0, 0, 0)),
                failure: ("You leave the dead to their rest.", fx(0, 0, 0, 0)),
            },
        ],
    },
    EventTemplate {
        description: "A faint distress call pulses from an escape pod tumbling through the dark.",
        choices: &[
            ChoiceTemplate {
                label: "Bring the pod aboard",
                success_percent: 70,
                success: (
                    "The pod holds a lost soul, grateful to join your voyage.",
                    fx(0, -5, 0, 2),
                ),
                failure: ("The pod was bait. Raiders strike before fleeing.", fx(-25, 0, -20, 0)),
            },
            ChoiceTemplate {
                label: "Ignore the signal",
                success_percent: 100,
                success: ("The signal fades behind you.", fx(0, 0, 0, 0)),
                failure: ("The signal fades behind you.", fx(0, 0, 0, 0)),
            },
        ],
    },
    EventTemplate {
        description: "An ion storm boils up ahead, crackling with stray charge.",
        choices: &[
            ChoiceTemplate {
                label: "Push through the storm",
                success_percent: 50,
                success: ("Your collectors drink deep from the storm.", fx(-5, 30, 0, 0)),
                failure: ("Lightning arcs across the hull.", fx(-30, -10, 0, 0)),
            },
            ChoiceTemplate {
                label: "Go around it",
                success_percent: 100,
                success: ("The detour costs power, but the ship is whole.", fx(0, -15, 0, 0)),
                failure: ("The detour costs power, but the ship is whole.", fx(0, -15, 0, 0)),
            },
        ],
    },
    EventTemplate {
        description: "A merchant vessel hails you, offering to trade.",
        choices: &[
            ChoiceTemplate {
                label: "Trade energy for resources",
                success_percent: 80,
                success: ("A fair deal, struck and honored.", fx(0, -20, 35, 0)),
                failure: ("The merchant shorts you and jumps away.", fx(0, -20, 5, 0)),
            },
            ChoiceTemplate {
                label: "Decline politely",
                success_percent: 100,
                success: ("The merchant shrugs and goes on their way.", fx(0, 0, 0, 0)),
                failure: ("The merchant shrugs and goes on their way.", fx(0, 0, 0, 0)),
            },
        ],
    },
    EventTemplate {
        description: "A wandering spirit brushes against the hull, whispering of treasure.",
        choices: &[
            ChoiceTemplate {
                label: "Follow the whispers",
                success_percent: 55,
                success: ("The spirit leads you to a cache of ancient relics.", fx(0, -10, 25, 3)),
                failure: (
                    "The whispers lead you in circles until the spirit dissipates.",
                    fx(-10, -25, 0, 0),
                ),
            },
            ChoiceTemplate {
                label: "Offer it passage",
                success_percent: 75,
                success: ("The spirit settles into an empty vessel below decks.", fx(0, 0, 0, 1)),
                failure: ("The spirit recoils and is gone.", fx(0, -5, 0, 0)),
            },
        ],
    },
];

struct ScanTemplate {
    weight: u32,
    description: &'static str,
    effects: Effects,
}

const EMPTY_SCANS: &[ScanTemplate] = &[
    ScanTemplate {
        weight: 70,
        description: "The scan finds nothing but dust.",
        effects: fx(0, 0, 0, 0),
    },
    ScanTemplate {
        weight: 30,
        description: "A lonely cargo canister drifts within reach.",
        effects: fx(0, 0, 15, 0),
    },
];

const STAR_SYSTEM_SCANS: &[ScanTemplate] = &[
    ScanTemplate {
        weight: 50,
        description: "Mineral-rich moons yield a steady haul.",
        effects: fx(0, 0, 30, 0),
    },
    ScanTemplate {
        weight: 35,
        description: "Solar wind tops up the energy banks.",
        effects: fx(0, 20, 0, 0),
    },
    ScanTemplate {
        weight: 15,
        description: "A solar flare scorches the hull.",
        effects: fx(-15, 0, 0, 0),
    },
];

const NEBULA_SCANS: &[ScanTemplate] = &[
    ScanTemplate {
        weight: 55,
        description: "The probes gather charged gas for the reactor.",
        effects: fx(0, 25, 0, 0),
    },
    ScanTemplate {
        weight: 25,
        description: "Crystallised gas settles into the collectors.",
        effects: fx(0, 0, 20, 0),
    },
    ScanTemplate {
        weight: 20,
        description: "Corrosive pockets eat at the plating.",
        effects: fx(-10, -5, 0, 0),
    },
];

const ASTEROID_SCANS: &[ScanTemplate] = &[
    ScanTemplate {
        weight: 60,
        description: "Rich ore veins are stripped from a passing rock.",
        effects: fx(0, -5, 45, 0),
    },
    ScanTemplate {
        weight: 40,
        description: "A collision sends debris into the hull.",
        effects: fx(-20, 0, 10, 0),
    },
];

const ANOMALY_SCANS: &[ScanTemplate] = &[
    ScanTemplate {
        weight: 40,
        description: "Something in the anomaly answers. A soul comes aboard.",
        effects: fx(0, -10, 0, 2),
    },
    ScanTemplate {
        weight: 35,
        description: "The probe returns carrying matter that should not exist.",
        effects: fx(0, 0, 35, 0),
    },
    ScanTemplate {
        weight: 25,
        description: "Reality hiccups and the ship shudders.",
        effects: fx(-15, -15, 0, 0),
    },
];

const BLACK_HOLE_SCANS: &[ScanTemplate] = &[
    ScanTemplate {
        weight: 45,
        description: "Tidal forces tear at the hull.",
        effects: fx(-30, -10, 0, 0),
    },
    ScanTemplate {
        weight: 35,
        description: "Exotic particles stream into the collectors.",
        effects: fx(0, 10, 60, 0),
    },
    ScanTemplate {
        weight: 20,
        description: "Lost souls, long trapped at the horizon, slip free.",
        effects: fx(-10, 0, 0, 4),
    },
];

fn scan_table(kind: SectorKind) -> &'static [ScanTemplate] {
    match kind {
        SectorKind::Empty => EMPTY_SCANS,
        SectorKind::StarSystem => STAR_SYSTEM_SCANS,
        SectorKind::Nebula => NEBULA_SCANS,
        SectorKind::AsteroidField => ASTEROID_SCANS,
        SectorKind::Anomaly => ANOMALY_SCANS,
        SectorKind::BlackHole => BLACK_HOLE_SCANS,
    }
}

/// A seeded, table-driven [`Narrator`] and [`ScanOracle`].
#[derive(Debug, Clone)]
pub struct TableNarrator {
    rng: StdRng,
}

impl TableNarrator {
    /// A narrator seeded for reproducible stories.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[self.rng.random_range(0..items.len())]
    }
}

impl Narrator for TableNarrator {
    fn sector_event(&mut self, kind: SectorKind, coord: Coord) -> NarrativeResult<String> {
        let opening = self.pick(sector_openings(kind));
        let coda = self.pick(SECTOR_CODAS);
        Ok(format!("Sector {coord}, {kind}. {opening} {coda}"))
    }

    fn interactive_event(&mut self) -> NarrativeResult<Option<InteractiveEvent>> {
        let template = &EVENTS[self.rng.random_range(0..EVENTS.len())];
        Ok(Some(InteractiveEvent {
            description: template.description.to_string(),
            choices: template.choices.iter().map(|c| c.label.to_string()).collect(),
        }))
    }

    fn resolve_choice(
        &mut self,
        description: &str,
        choice: &str,
    ) -> NarrativeResult<Option<EventOutcome>> {
        let template = EVENTS
            .iter()
            .find(|e| e.description == description)
            .and_then(|e| e.choices.iter().find(|c| c.label.eq_ignore_ascii_case(choice)));

        let Some(template) = template else {
            return Ok(Some(EventOutcome {
                outcome: format!(
                    "The crew carries out the order to {}. Nothing more comes of it.",
                    choice.to_lowercase()
                ),
                effects: Effects::default(),
            }));
        };

        let roll: u32 = self.rng.random_range(1..=100);
        let (text, effects) = if roll <= template.success_percent {
            template.success
        } else {
            template.failure
        };
        Ok(Some(EventOutcome {
            outcome: text.to_string(),
            effects,
        }))
    }
}

impl ScanOracle for TableNarrator {
    fn scan_result(&mut self, kind: SectorKind) -> NarrativeResult<Option<ScanResult>> {
        let table = scan_table(kind);
        let total: u32 = table.iter().map(|t| t.weight).sum();
        let mut roll = self.rng.random_range(0..total);
        for entry in table {
            if roll < entry.weight {
                return Ok(Some(ScanResult {
                    description: entry.description.to_string(),
                    effects: entry.effects,
                }));
            }
            roll -= entry.weight;
        }
        Ok(None)
    }
}
