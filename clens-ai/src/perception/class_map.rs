//! Food class map
//!
//! Static lookup data: which coarse class a label belongs to, its scientific
//! taxonomy, and per-class physical heuristics used by the reference stages.

use once_cell::sync::Lazy;
use std::collections::HashMap;

const FOOD_CLASSES: &[(&str, &[&str])] = &[
    (
        "fruit",
        &[
            "apple", "banana", "orange", "pear", "strawberry", "blueberry", "raspberry", "mango",
            "pineapple", "grape", "lemon", "lime", "avocado", "pomegranate", "kiwi", "peach",
            "plum",
        ],
    ),
    (
        "vegetable",
        &[
            "spinach", "kale", "lettuce", "tomato", "carrot", "broccoli", "onion", "garlic",
            "shallot", "leek", "bell pepper", "chili", "zucchini", "eggplant", "cucumber",
            "potato", "sweet potato", "ginger", "celery", "asparagus", "cauliflower", "mushroom",
        ],
    ),
    (
        "protein",
        &[
            "chicken", "beef", "pork", "lamb", "egg", "tofu", "salmon", "shrimp", "tempeh",
            "beans", "lentils",
        ],
    ),
    ("dairy", &["cheese", "yogurt", "milk"]),
    (
        "condiment",
        &[
            "butter", "mayo", "ketchup", "soy sauce", "mustard", "olive oil", "vinegar", "honey",
            "maple syrup", "miso", "tahini",
        ],
    ),
    (
        "herb",
        &[
            "basil", "cilantro", "parsley", "thyme", "rosemary", "oregano", "mint", "dill",
            "chives", "sage",
        ],
    ),
];

const SCIENTIFIC_NAMES: &[(&str, &str)] = &[
    // Fruits
    ("apple", "Malus domestica"),
    ("banana", "Musa acuminata"),
    ("orange", "Citrus sinensis"),
    ("pear", "Pyrus communis"),
    ("strawberry", "Fragaria × ananassa"),
    ("blueberry", "Vaccinium corymbosum"),
    ("raspberry", "Rubus idaeus"),
    ("mango", "Mangifera indica"),
    ("pineapple", "Ananas comosus"),
    ("grape", "Vitis vinifera"),
    ("lemon", "Citrus limon"),
    ("lime", "Citrus aurantiifolia"),
    ("avocado", "Persea americana"),
    ("pomegranate", "Punica granatum"),
    ("kiwi", "Actinidia deliciosa"),
    ("peach", "Prunus persica"),
    ("plum", "Prunus domestica"),
    // Vegetables
    ("spinach", "Spinacia oleracea"),
    ("kale", "Brassica oleracea var. sabellica"),
    ("lettuce", "Lactuca sativa"),
    ("tomato", "Solanum lycopersicum"),
    ("carrot", "Daucus carota subsp. sativus"),
    ("broccoli", "Brassica oleracea var. italica"),
    ("onion", "Allium cepa"),
    ("garlic", "Allium sativum"),
    ("shallot", "Allium cepa gr. aggregatum"),
    ("leek", "Allium ampeloprasum"),
    ("bell pepper", "Capsicum annuum"),
    ("chili", "Capsicum frutescens"),
    ("zucchini", "Cucurbita pepo"),
    ("eggplant", "Solanum melongena"),
    ("cucumber", "Cucumis sativus"),
    ("potato", "Solanum tuberosum"),
    ("sweet potato", "Ipomoea batatas"),
    ("ginger", "Zingiber officinale"),
    ("celery", "Apium graveolens"),
    ("asparagus", "Asparagus officinalis"),
    ("cauliflower", "Brassica oleracea var. botrytis"),
    ("mushroom", "Agaricus bisporus"),
    // Proteins & dairy
    ("chicken", "Gallus gallus domesticus"),
    ("beef", "Bos taurus"),
    ("pork", "Sus scrofa domesticus"),
    ("lamb", "Ovis aries"),
    ("egg", "Gallus gallus domesticus (Ovum)"),
    ("tofu", "Glycine max (Curd)"),
    ("salmon", "Salmo salar"),
    ("shrimp", "Caridea"),
    ("cheese", "Caseus"),
    ("yogurt", "Oxygala"),
    ("milk", "Lac"),
    ("tempeh", "Glycine max (Fermented)"),
    ("beans", "Phaseolus vulgaris"),
    ("lentils", "Lens culinaris"),
    // Condiments
    ("butter", "Butyrum"),
    ("mayo", "Mayonensis"),
    ("ketchup", "Solanum lycopersicum (Condimentum)"),
    ("soy sauce", "Glycine max (Liquamen)"),
    ("mustard", "Sinapis alba"),
    ("olive oil", "Olea europaea (Oleum)"),
    ("vinegar", "Acetum"),
    ("honey", "Mel"),
    ("maple syrup", "Acer saccharum (Sirupus)"),
    ("miso", "Glycine max (Miso)"),
    ("tahini", "Sesamum indicum (Pasta)"),
    // Herbs
    ("basil", "Ocimum basilicum"),
    ("cilantro", "Coriandrum sativum"),
    ("parsley", "Petroselinum crispum"),
    ("thyme", "Thymus vulgaris"),
    ("rosemary", "Salvia rosmarinus"),
    ("oregano", "Origanum vulgare"),
    ("mint", "Mentha"),
    ("dill", "Anethum graveolens"),
    ("chives", "Allium schoenoprasum"),
    ("sage", "Salvia officinalis"),
];

static CLASS_BY_LABEL: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    FOOD_CLASSES
        .iter()
        .flat_map(|(class, labels)| labels.iter().map(move |label| (*label, *class)))
        .collect()
});

static SCIENTIFIC_BY_LABEL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| SCIENTIFIC_NAMES.iter().copied().collect());

/// Physical heuristics for a food class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProfile {
    /// Typical refrigerated shelf life of a fresh item
    pub shelf_life_days: f64,
    /// Grams per thousand square pixels of mask area
    pub grams_per_kilopixel: f64,
    /// Mass of a typical single item, used when no mask is available
    pub typical_unit_grams: f64,
}

const DEFAULT_PROFILE: ClassProfile = ClassProfile {
    shelf_life_days: 5.0,
    grams_per_kilopixel: 5.0,
    typical_unit_grams: 100.0,
};

fn lookup_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Coarse food class of a label, if known
pub fn food_class(label: &str) -> Option<&'static str> {
    CLASS_BY_LABEL.get(lookup_key(label).as_str()).copied()
}

/// Scientific taxonomy of a label, if known
pub fn scientific_name(label: &str) -> Option<&'static str> {
    SCIENTIFIC_BY_LABEL.get(lookup_key(label).as_str()).copied()
}

/// Heuristics for a class; unknown classes get a generic profile
pub fn class_profile(class: Option<&str>) -> ClassProfile {
    match class {
        Some("fruit") => ClassProfile {
            shelf_life_days: 7.0,
            grams_per_kilopixel: 6.0,
            typical_unit_grams: 150.0,
        },
        Some("vegetable") => ClassProfile {
            shelf_life_days: 5.0,
            grams_per_kilopixel: 5.0,
            typical_unit_grams: 120.0,
        },
        Some("protein") => ClassProfile {
            shelf_life_days: 3.0,
            grams_per_kilopixel: 8.0,
            typical_unit_grams: 200.0,
        },
        Some("dairy") => ClassProfile {
            shelf_life_days: 10.0,
            grams_per_kilopixel: 7.0,
            typical_unit_grams: 150.0,
        },
        Some("condiment") => ClassProfile {
            shelf_life_days: 60.0,
            grams_per_kilopixel: 3.0,
            typical_unit_grams: 30.0,
        },
        Some("herb") => ClassProfile {
            shelf_life_days: 4.0,
            grams_per_kilopixel: 1.5,
            typical_unit_grams: 20.0,
        },
        _ => DEFAULT_PROFILE,
    }
}
