//! Curated offline principle corpus.
//!
//! The last rung of the retrieval cascade: when the store and the web both
//! come back empty, these passages keep the domain expert grounded. Every
//! passage is provenance-marked `architectural_knowledge` so the dashboard
//! can distinguish offline knowledge from live results.

use super::store::{PassageMetadata, StoredPassage};

/// Provenance marker for offline corpus passages.
pub const OFFLINE_SOURCE: &str = "architectural_knowledge";

struct CorpusEntry {
    keys: &'static [&'static str],
    title: &'static str,
    content: &'static str,
    url: &'static str,
}

const CORPUS: &[CorpusEntry] = &[
    CorpusEntry {
        keys: &["adaptive reuse", "adaptive", "reuse", "conversion", "renovation"],
        title: "Tate Modern, London",
        content: "Former Bankside power station transformed by Herzog & de Meuron into a \
                  world-class art museum, demonstrating adaptive reuse of industrial \
                  heritage: the turbine hall becomes the public room the city never had.",
        url: "https://www.tate.org.uk/visit/tate-modern",
    },
    CorpusEntry {
        keys: &["adaptive reuse", "reuse", "infrastructure", "landscape", "park"],
        title: "The High Line, New York",
        content: "Abandoned elevated railway converted by James Corner Field Operations \
                  with Diller Scofidio + Renfro into a linear public park, showing how \
                  obsolete infrastructure can be re-read as public space.",
        url: "https://www.thehighline.org/",
    },
    CorpusEntry {
        keys: &["community center", "community", "cultural"],
        title: "Kulturhuset, Stockholm",
        content: "Peter Celsing's cultural center fronts Sergels Torg with a fully glazed \
                  facade, stacking flexible community floors behind it so the building \
                  reads as an open shelf of public life.",
        url: "https://kulturhusetstadsteatern.se/",
    },
    CorpusEntry {
        keys: &["community center", "community", "arts", "performance"],
        title: "Aviva Studios, Manchester",
        content: "A former industrial site reworked into a flexible arts venue whose \
                  warehouse hall and theatre can combine or divide, trading fixed program \
                  for configurable community use.",
        url: "https://factoryinternational.org/",
    },
    CorpusEntry {
        keys: &["circulation", "corridor", "movement", "sequence"],
        title: "Circulation as spatial promenade",
        content: "Treat circulation as the building's narrative rather than leftover \
                  space: Le Corbusier's promenade architecturale and Villa Savoye's ramp \
                  show movement organizing program, daylight, and views in one gesture.",
        url: "https://www.fondationlecorbusier.fr/",
    },
    CorpusEntry {
        keys: &["daylight", "light", "lighting", "window", "glazing"],
        title: "Daylighting principles",
        content: "Daylight quality depends on orientation, section, and surface before \
                  glazing area: Kahn's Kimbell Art Museum bounces southern light off \
                  cycloid vaults so galleries read as naturally lit without glare.",
        url: "https://kimbellart.org/",
    },
    CorpusEntry {
        keys: &["courtyard", "atrium", "organize around"],
        title: "Courtyard organization",
        content: "A courtyard trades floor area for climate and orientation: it gives \
                  every adjacent room daylight, a shared address, and cross-ventilation, \
                  as in Barragan's houses and Aalto's Saynatsalo town hall.",
        url: "https://www.alvaraalto.fi/",
    },
    CorpusEntry {
        keys: &["structure", "structural", "span", "grid", "column"],
        title: "Structural clarity",
        content: "Pick the structural system with the program's largest span and let the \
                  rest follow its grid; mixing systems per room costs coordination and \
                  legibility, as Mies's long-span halls demonstrate by contrast.",
        url: "https://miessociety.org/",
    },
    CorpusEntry {
        keys: &["sustainable", "sustainability", "passive", "energy", "solar"],
        title: "Passive-first environmental design",
        content: "Orientation, massing, and envelope do the heavy lifting before any \
                  system is specified: compact form, shaded south glazing, and stack \
                  ventilation routinely halve loads before mechanical design begins.",
        url: "https://www.cibse.org/",
    },
    CorpusEntry {
        keys: &["material", "materials", "palette", "timber", "concrete"],
        title: "Material honesty",
        content: "Zumthor's Therme Vals builds atmosphere from one dominant material \
                  used structurally and spatially; a short palette with a clear hierarchy \
                  outperforms a catalogue of finishes.",
        url: "https://www.7132.com/",
    },
    CorpusEntry {
        keys: &["accessibility", "ada", "universal", "inclusive"],
        title: "Universal design as generator",
        content: "Accessible routes drawn first, not retrofitted, produce better \
                  buildings for everyone: level entries, generous corridors (1120 mm \
                  clear width and up), and ramps doubling as promenade.",
        url: "https://www.ada.gov/",
    },
];

/// Looks up offline passages for a topic, most specific match first.
/// Returns up to `k` passages with the `architectural_knowledge` provenance.
#[must_use]
pub fn fallback_passages(topic: &str, k: usize) -> Vec<StoredPassage> {
    let lower = topic.to_lowercase();
    let mut matched: Vec<&CorpusEntry> = CORPUS
        .iter()
        .filter(|entry| entry.keys.iter().any(|key| lower.contains(key)))
        .collect();

    // A topic with no family match still deserves grounding; serve the
    // general principles.
    if matched.is_empty() {
        matched = CORPUS
            .iter()
            .filter(|entry| {
                entry.keys.contains(&"circulation") || entry.keys.contains(&"community center")
            })
            .collect();
    }

    matched
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, entry)| StoredPassage {
            content: entry.content.to_string(),
            metadata: PassageMetadata {
                title: entry.title.to_string(),
                source: OFFLINE_SOURCE.to_string(),
                url: Some(entry.url.to_string()),
                kind: "principle".to_string(),
            },
            // Offline passages rank below genuine hits of equal order.
            distance: 0.3 + i as f64 * 0.05,
        })
        .collect()
}
