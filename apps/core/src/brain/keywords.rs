//! Fixed keyword tables used by the classifier and the domain gate.
//!
//! Every table is an ordered const slice: matching code iterates in the
//! declared order, so classification stays reproducible. French is the
//! primary language, with the English variants users actually type.

/// General-conversation terms the gate always lets through.
pub const GENERAL_CONVERSATION_KEYWORDS: &[&str] = &[
    // Greetings
    "bonjour", "salut", "coucou", "hello", "hi", "hey", "bonsoir", "bonne nuit", "yo", "wesh",
    "salam", "hola",
    // Politeness
    "merci", "remercie", "thanks", "thank you", "merci beaucoup", "s'il te plaît",
    "s'il vous plaît", "please", "stp", "svp", "de rien", "je t'en prie",
    // Farewells
    "au revoir", "bye", "adieu", "ciao", "à plus", "à bientôt", "goodbye", "see you", "à demain",
    "bonne journée", "bonne soirée",
    // Help requests
    "aide", "help", "assistance", "support", "aide-moi", "peux-tu m'aider", "j'ai besoin d'aide",
    // Repetition requests
    "répète", "repeat", "encore", "again", "peux-tu répéter", "redire", "redis",
    "je n'ai pas compris", "pas compris", "explique à nouveau", "reprends", "recommence",
    // Interrogatives
    "quoi", "comment", "pourquoi", "quand", "où", "qui", "quel", "quelle", "quels", "quelles",
    "combien", "lequel", "laquelle", "est-ce que", "qu'est-ce que",
    // Explanations
    "explique", "définis", "explain", "définition", "signification", "que veut dire",
    "c'est quoi", "qu'est-ce que c'est",
    // Affirmations / negations
    "oui", "non", "ok", "d'accord", "bien", "yes", "no", "okay", "parfait", "exact", "correct",
    "faux", "incorrect",
    // Small talk
    "ça va", "comment ça va", "tu vas bien", "how are you", "quoi de neuf", "très bien", "super",
    "génial", "cool", "excellent",
    // Understanding checks
    "compris", "entendu", "je vois", "je comprends", "pas de problème", "bien reçu",
    // Simple commands
    "stop", "arrête", "continue", "vas-y", "suivant", "précédent", "retour",
];

/// Automotive vocabulary that marks a message as on-topic.
pub const AUTOMOTIVE_KEYWORDS: &[&str] = &[
    // Vehicle types
    "voiture", "automobile", "véhicule", "auto", "moto", "scooter", "camion", "utilitaire",
    "fourgon", "bus", "poids lourd", "remorque", "caravane", "camping-car", "van", "pick-up",
    "suv", "crossover", "berline", "break", "citadine", "cabriolet", "coupé", "monospace", "4x4",
    // Brands
    "renault", "peugeot", "citroën", "citroen", "dacia", "seat", "skoda", "bmw", "mercedes",
    "audi", "volkswagen", "vw", "opel", "ford", "fiat", "ferrari", "porsche", "volvo", "tesla",
    "mini", "land rover", "jaguar", "toyota", "honda", "nissan", "lexus", "mazda", "mitsubishi",
    "suzuki", "hyundai", "kia", "jeep", "dodge", "chevrolet", "byd",
    // Popular models
    "clio", "megane", "captur", "duster", "sandero", "logan", "golf", "polo", "passat", "tiguan",
    "308", "208", "3008", "2008", "c3", "c4", "berlingo", "corolla", "yaris", "rav4",
    // Engine and powertrain
    "moteur", "cylindre", "soupape", "piston", "vilebrequin", "arbre à cames", "culasse", "turbo",
    "injection", "injecteur", "allumage", "bougie", "bobine", "courroie", "distribution",
    "embrayage", "transmission", "boîte vitesse", "boite vitesse", "chevaux", "puissance",
    "couple", "régime",
    // Fuel and energy
    "carburant", "essence", "diesel", "gazole", "gpl", "hybride", "électrique", "batterie",
    "recharge", "autonomie", "consommation",
    // Braking
    "frein", "freins", "freinage", "disque", "plaquette", "étrier", "tambour", "abs", "esp",
    // Suspension and steering
    "suspension", "amortisseur", "ressort", "rotule", "direction", "crémaillère", "volant",
    "pneu", "pneus", "pression", "gonflage", "roue", "roues", "jante",
    // Electrical
    "alternateur", "démarreur", "fusible", "relais", "câblage", "prise obd", "diagnostic",
    "calculateur", "capteur", "sonde",
    // Interior
    "tableau de bord", "tableau bord", "compteur", "jauge", "voyant", "témoin", "siège",
    "ceinture", "airbag", "climatisation", "chauffage", "gps",
    // Exterior
    "phare", "phares", "feu", "feux", "clignotant", "essuie-glace", "pare-brise", "portière",
    "coffre", "capot", "pare-chocs", "rétroviseur",
    // Maintenance and repair
    "entretien", "maintenance", "révision", "vidange", "filtre", "huile", "liquide",
    "refroidissement", "antigel", "niveau", "contrôle", "panne", "dépannage", "réparation",
    "garage", "mécanicien", "atelier", "carrosserie",
    // Warning lights
    "check engine", "voyant moteur", "surchauffe", "pression huile", "frein main", "tpms",
    "filtre particules", "fap", "adblue", "échappement", "catalyseur", "pot catalytique",
    // Driving and ownership
    "conduite", "conducteur", "permis", "sécurité routière", "accident", "assurance",
    "carte grise", "contrôle technique", "vignette", "pollution",
    // Buying and selling
    "achat", "acheter", "vente", "vendre", "occasion", "kilométrage", "financement", "leasing",
    "reprise", "cote", "prix",
];

/// Interrogative markers that let a message through the gate.
pub const QUESTION_MARKERS: &[&str] = &[
    "?", "quoi", "comment", "pourquoi", "quand", "où", "qui", "quel", "quelle", "quels",
    "quelles",
];

/// Organization / service terms mapping a message to the `domain` intent.
pub const DOMAIN_KEYWORDS: &[&str] =
    &["kounhany", "application", "réserver", "garage", "forfait", "service"];

/// Mechanical / maintenance terms mapping a message to the `technical` intent.
pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "huile", "moteur", "frein", "pneu", "vidange", "batterie", "voyant", "entretien",
    "réparation", "panne", "bruit", "problème",
];

/// Greeting terms mapping a message to the `greeting` intent.
pub const GREETING_KEYWORDS: &[&str] = &["bonjour", "salut", "hello", "bonsoir", "hey", "coucou"];

/// Phrases that trigger the repeat-last-answer path.
pub const REPEAT_TRIGGERS: &[&str] = &[
    "répète", "repeat", "encore", "redire", "expliquer le", "explique le", "explain it",
    "re-explain", "reexplain", "expliquer ça", "explique ça",
];

/// Markers of a request for recent news.
pub const NEWS_KEYWORDS: &[&str] = &[
    "actualité", "actualite", "news", "nouveauté", "nouveau", "dernière", "derniere", "latest",
    "récent", "recent", "2024", "2025", "sortie", "lancement",
];

/// Brands recognized by the news-augmentation detector.
pub const NEWS_BRANDS: &[&str] = &[
    "dacia", "renault", "peugeot", "citroen", "bmw", "mercedes", "audi", "volkswagen", "toyota",
    "ford", "fiat", "tesla", "hyundai", "kia",
];

/// Brands recognized by the recall-search detector.
pub const RECALL_BRANDS: &[&str] = &[
    "renault", "peugeot", "citroen", "dacia", "bmw", "mercedes", "audi", "volkswagen", "toyota",
    "ford", "fiat", "opel", "seat", "skoda",
];

/// Filler words removed by the question normalizer.
pub const STOPWORDS: &[&str] = &[
    "le", "la", "les", "un", "une", "des", "de", "du", "et", "est", "je", "tu", "il", "elle",
    "nous", "vous", "ils", "elles", "mon", "ma", "mes", "ton", "ta", "tes", "son", "sa", "ses",
];
