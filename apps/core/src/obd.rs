//! Static OBD-II reference table.
//!
//! Loaded once at startup and never mutated. Exact lookup is served from a
//! hash index; keyword search iterates the table in declared order so
//! results are stable.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// How urgently a fault should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    fn icon(&self) -> &'static str {
        match self {
            Severity::High => "🔴",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
        }
    }

    fn label_fr(&self) -> &'static str {
        match self {
            Severity::High => "ÉLEVÉE - À traiter rapidement",
            Severity::Medium => "MOYENNE - À surveiller",
            Severity::Low => "FAIBLE - Non urgent",
        }
    }
}

/// Reference data for one diagnostic code.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiagnosticCode {
    pub description: &'static str,
    pub severity: Severity,
    pub cause: &'static str,
    pub solution: &'static str,
}

macro_rules! code {
    ($desc:expr, $sev:expr, $cause:expr, $solution:expr) => {
        DiagnosticCode {
            description: $desc,
            severity: $sev,
            cause: $cause,
            solution: $solution,
        }
    };
}

use Severity::{High, Low, Medium};

/// The reference table, in declared (search) order.
static CODE_TABLE: &[(&str, DiagnosticCode)] = &[
    // Air/fuel metering
    ("P0011", code!("Position d'arbre à cames - Calage trop avancé (Banc 1)", Medium, "Huile moteur sale ou niveau bas, solénoïde VVT défectueux", "Vidange d'huile, vérifier le solénoïde VVT et la chaîne de distribution")),
    ("P0016", code!("Corrélation position vilebrequin/arbre à cames (Banc 1 Capteur A)", High, "Chaîne de distribution étirée, capteurs défectueux", "Vérifier la chaîne de distribution et les capteurs de position")),
    ("P0030", code!("Circuit de chauffage de la sonde lambda (Banc 1 Capteur 1)", Medium, "Sonde lambda défectueuse ou câblage endommagé", "Remplacer la sonde lambda ou réparer le câblage")),
    ("P0100", code!("Dysfonctionnement du circuit du débitmètre d'air", Medium, "Capteur MAF défectueux ou encrassé", "Nettoyer ou remplacer le capteur MAF")),
    ("P0101", code!("Problème de performance du circuit du débitmètre d'air", Medium, "Capteur MAF sale ou fuite d'air après le capteur", "Nettoyer le capteur MAF, vérifier les fuites d'air")),
    ("P0115", code!("Dysfonctionnement du circuit de température du liquide de refroidissement", Medium, "Capteur de température défectueux", "Remplacer le capteur de température")),
    ("P0117", code!("Signal bas du circuit de température du liquide de refroidissement", Medium, "Court-circuit ou capteur défectueux", "Vérifier le câblage, remplacer le capteur")),
    ("P0120", code!("Dysfonctionnement du circuit du capteur de position papillon A", High, "Capteur de position papillon défectueux", "Remplacer le capteur de position papillon")),
    ("P0128", code!("Thermostat - Température en dessous de la température de régulation", Medium, "Thermostat bloqué en position ouverte", "Remplacer le thermostat")),
    // Oxygen sensors
    ("P0130", code!("Dysfonctionnement du circuit de la sonde O2 (Banc 1 Capteur 1)", Medium, "Sonde lambda défectueuse ou câblage endommagé", "Remplacer la sonde lambda amont banc 1")),
    ("P0133", code!("Réponse lente du circuit sonde O2 (Banc 1 Capteur 1)", Medium, "Sonde lambda vieillissante", "Remplacer la sonde lambda")),
    ("P0135", code!("Dysfonctionnement du circuit de chauffage sonde O2 (Banc 1 Capteur 1)", Medium, "Circuit de chauffage de la sonde défectueux", "Remplacer la sonde lambda")),
    ("P0136", code!("Dysfonctionnement du circuit de la sonde O2 (Banc 1 Capteur 2)", Medium, "Sonde lambda aval défectueuse", "Remplacer la sonde lambda aval")),
    // Fuel trim
    ("P0171", code!("Mélange trop pauvre (Banc 1)", Medium, "Fuite d'air, capteur MAF sale, injecteurs bouchés, pompe à carburant faible", "Rechercher les fuites d'air, nettoyer le capteur MAF, vérifier la pression de carburant")),
    ("P0172", code!("Mélange trop riche (Banc 1)", Medium, "Injecteurs qui fuient, capteur MAF défectueux, pression de carburant élevée", "Vérifier les injecteurs, nettoyer/remplacer le capteur MAF")),
    ("P0174", code!("Mélange trop pauvre (Banc 2)", Medium, "Fuite d'air côté banc 2, problème d'alimentation en carburant", "Rechercher les fuites d'air, vérifier le système de carburant")),
    // Misfires
    ("P0300", code!("Ratés d'allumage aléatoires/multiples cylindres détectés", High, "Bougies usées, bobines défectueuses, injecteurs sales, fuite d'air", "Vérifier bougies, bobines, injecteurs et rechercher les fuites d'air")),
    ("P0301", code!("Raté d'allumage détecté - Cylindre 1", High, "Bougie, bobine ou injecteur du cylindre 1 défectueux", "Remplacer la bougie, vérifier la bobine et l'injecteur du cylindre 1")),
    ("P0302", code!("Raté d'allumage détecté - Cylindre 2", High, "Bougie, bobine ou injecteur du cylindre 2 défectueux", "Remplacer la bougie, vérifier la bobine et l'injecteur du cylindre 2")),
    ("P0303", code!("Raté d'allumage détecté - Cylindre 3", High, "Bougie, bobine ou injecteur du cylindre 3 défectueux", "Remplacer la bougie, vérifier la bobine et l'injecteur du cylindre 3")),
    ("P0304", code!("Raté d'allumage détecté - Cylindre 4", High, "Bougie, bobine ou injecteur du cylindre 4 défectueux", "Remplacer la bougie, vérifier la bobine et l'injecteur du cylindre 4")),
    // Ignition / position sensors
    ("P0325", code!("Dysfonctionnement du circuit du capteur de cliquetis 1", Medium, "Capteur de cliquetis défectueux ou câblage endommagé", "Remplacer le capteur de cliquetis ou réparer le câblage")),
    ("P0335", code!("Dysfonctionnement du circuit du capteur de position vilebrequin A", High, "Capteur de vilebrequin défectueux, câblage endommagé", "Remplacer le capteur de position vilebrequin")),
    ("P0340", code!("Dysfonctionnement du circuit du capteur de position d'arbre à cames", High, "Capteur d'arbre à cames défectueux ou câblage", "Remplacer le capteur de position d'arbre à cames")),
    // Diesel
    ("P0380", code!("Dysfonctionnement du circuit des bougies de préchauffage A", Medium, "Bougie de préchauffage défectueuse ou relais", "Vérifier les bougies de préchauffage et le relais")),
    // EGR
    ("P0400", code!("Dysfonctionnement du débit de recirculation des gaz d'échappement", Medium, "Vanne EGR encrassée ou défectueuse", "Nettoyer ou remplacer la vanne EGR")),
    ("P0401", code!("Débit EGR insuffisant détecté", Medium, "Vanne EGR bloquée, passages obstrués", "Nettoyer les passages EGR et la vanne")),
    // Catalyst
    ("P0420", code!("Efficacité du catalyseur en dessous du seuil (Banc 1)", Medium, "Catalyseur usé ou défectueux, sonde lambda défaillante", "Vérifier les sondes lambda, remplacer le catalyseur si nécessaire")),
    ("P0421", code!("Efficacité du catalyseur à chaud en dessous du seuil (Banc 1)", Medium, "Catalyseur endommagé ou contamination", "Vérifier l'état du catalyseur et les sondes lambda")),
    ("P0430", code!("Efficacité du catalyseur en dessous du seuil (Banc 2)", Medium, "Catalyseur du banc 2 usé ou défectueux", "Remplacer le catalyseur du banc 2")),
    // EVAP
    ("P0440", code!("Dysfonctionnement du système de contrôle des émissions par évaporation", Low, "Bouchon de réservoir mal fermé, fuite dans le système EVAP", "Vérifier le bouchon de réservoir, rechercher les fuites EVAP")),
    ("P0442", code!("Petite fuite détectée dans le système EVAP", Low, "Petite fuite dans le système de récupération des vapeurs", "Test de fumée pour localiser la fuite, vérifier le bouchon")),
    ("P0455", code!("Grosse fuite détectée dans le système EVAP", Low, "Bouchon de réservoir manquant ou grosse fuite", "Vérifier le bouchon de réservoir, inspecter les durites EVAP")),
    // Speed / idle
    ("P0500", code!("Dysfonctionnement du capteur de vitesse du véhicule", Medium, "Capteur de vitesse défectueux ou câblage", "Remplacer le capteur de vitesse")),
    ("P0505", code!("Dysfonctionnement du système de contrôle de ralenti", Medium, "Vanne de ralenti encrassée ou défectueuse", "Nettoyer ou remplacer la vanne de ralenti")),
    // Voltage / ECU
    ("P0562", code!("Tension système basse", Medium, "Batterie faible, alternateur défaillant", "Tester la batterie et l'alternateur")),
    ("P0563", code!("Tension système haute", Medium, "Alternateur en surcharge", "Remplacer le régulateur ou l'alternateur")),
    ("P0600", code!("Dysfonctionnement de la liaison de communication série", High, "Problème de communication interne du calculateur", "Reprogrammation ou remplacement du calculateur")),
    ("P0601", code!("Erreur de somme de contrôle de la mémoire du calculateur", High, "Mémoire du calculateur corrompue", "Reprogrammation ou remplacement du calculateur")),
    // Transmission
    ("P0700", code!("Dysfonctionnement du système de contrôle de transmission", High, "Problème général de transmission, autre code présent", "Lire les codes supplémentaires, diagnostic approfondi")),
    ("P0715", code!("Dysfonctionnement du circuit du capteur de vitesse d'entrée", High, "Capteur de vitesse de turbine défectueux", "Remplacer le capteur de vitesse d'entrée")),
    ("P0740", code!("Dysfonctionnement du circuit d'embrayage du convertisseur de couple", High, "Solénoïde TCC défectueux ou câblage", "Remplacer le solénoïde TCC")),
    ("P1000", code!("Test de préparation des systèmes OBD non terminé", Low, "Cycles de conduite insuffisants après effacement des codes", "Effectuer un cycle de conduite complet")),
    ("P2002", code!("Efficacité du filtre à particules en dessous du seuil", High, "Filtre à particules (FAP) colmaté ou défectueux", "Régénération forcée ou remplacement du FAP")),
    ("P2279", code!("Fuite dans le système d'admission d'air", Medium, "Fuite d'air dans l'admission", "Rechercher et réparer la fuite d'air")),
    // Communication
    ("U0100", code!("Perte de communication avec le calculateur moteur", High, "Problème de communication CAN bus", "Vérifier le câblage CAN bus et le calculateur")),
    ("U0101", code!("Perte de communication avec le calculateur de transmission", High, "Problème de communication avec le TCM", "Vérifier le câblage et le calculateur de transmission")),
    ("U0121", code!("Perte de communication avec le module ABS", High, "Problème de communication avec le module ABS", "Vérifier le câblage et le module ABS")),
    ("U0140", code!("Perte de communication avec le module de carrosserie", Medium, "Problème de communication avec le BCM", "Vérifier le câblage et le module de carrosserie")),
    // Body
    ("B0001", code!("Contrôle de déploiement airbag frontal conducteur étape 1", High, "Problème dans le circuit de l'airbag conducteur", "Diagnostic du système airbag requis")),
    ("B1000", code!("Dysfonctionnement du calculateur", High, "Problème interne du calculateur", "Reprogrammation ou remplacement du calculateur")),
    // Chassis
    ("C0035", code!("Circuit du capteur de vitesse roue avant gauche", Medium, "Capteur ABS avant gauche défectueux", "Remplacer le capteur ABS avant gauche")),
    ("C0040", code!("Circuit du capteur de vitesse roue avant droite", Medium, "Capteur ABS avant droit défectueux", "Remplacer le capteur ABS avant droit")),
    ("C0110", code!("Circuit du moteur de pompe ABS", High, "Pompe ABS défectueuse", "Remplacer la pompe ABS ou le module")),
];

static CODE_INDEX: LazyLock<HashMap<&'static str, &'static DiagnosticCode>> =
    LazyLock::new(|| CODE_TABLE.iter().map(|(code, info)| (*code, info)).collect());

/// Exact lookup. A bare numeric code is assumed to be powertrain (`P`).
pub fn lookup(code: &str) -> Option<&'static DiagnosticCode> {
    let mut code = code.trim().to_uppercase();
    if !code.starts_with(['P', 'B', 'C', 'U']) {
        code.insert(0, 'P');
    }
    CODE_INDEX.get(code.as_str()).copied()
}

/// Keyword search across description, cause and solution. Capped at 10.
pub fn search(query: &str) -> Vec<(&'static str, &'static DiagnosticCode)> {
    let query = query.to_lowercase();
    CODE_TABLE
        .iter()
        .filter(|(_, info)| {
            info.description.to_lowercase().contains(&query)
                || info.cause.to_lowercase().contains(&query)
                || info.solution.to_lowercase().contains(&query)
        })
        .map(|(code, info)| (*code, info))
        .take(10)
        .collect()
}

/// Format the reference data into the assistant's French response.
pub fn format_response(code: &str, info: &DiagnosticCode) -> String {
    format!(
        "🔧 **CODE OBD-II: {}**\n\n\
         📋 **Description:** {}\n\n\
         {} **Gravité:** {}\n\n\
         ⚠️ **Cause probable:** {}\n\n\
         🔨 **Solution recommandée:** {}\n\n\
         💡 *Pour une réparation fiable, utilisez KOUNHANY pour trouver un garage audité près de chez vous.*",
        code.to_uppercase(),
        info.description,
        info.severity.icon(),
        info.severity.label_fr(),
        info.cause,
        info.solution,
    )
}

/// Response for a well-formed code absent from the table.
pub fn unknown_code_response(code: &str) -> String {
    format!(
        "🔧 **Code OBD-II: {}**\n\nCe code n'est pas dans ma base de données. Je vous recommande \
         de consulter un mécanicien ou d'utiliser KOUNHANY pour trouver un garage audité qui \
         pourra effectuer un diagnostic complet.",
        code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_code() {
        let info = lookup("P0420").expect("P0420 should be in the table");
        assert_eq!(info.severity, Severity::Medium);
        assert!(info.description.contains("catalyseur"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(lookup("p0300").is_some());
        assert!(lookup(" u0100 ").is_some());
    }

    #[test]
    fn test_lookup_assumes_powertrain_prefix() {
        assert!(lookup("0420").is_some());
    }

    #[test]
    fn test_lookup_unknown_code() {
        assert!(lookup("P9999").is_none());
    }

    #[test]
    fn test_search_matches_description() {
        let results = search("catalyseur");
        assert!(!results.is_empty());
        assert!(results.iter().any(|(code, _)| *code == "P0420"));
    }

    #[test]
    fn test_search_capped_at_ten() {
        // "capteur" appears in many causes/solutions.
        assert!(search("capteur").len() <= 10);
    }

    #[test]
    fn test_search_no_match() {
        assert!(search("zeppelin").is_empty());
    }

    #[test]
    fn test_format_response_mentions_severity() {
        let info = lookup("P0420").unwrap();
        let response = format_response("P0420", info);
        assert!(response.contains("P0420"));
        assert!(response.contains("MOYENNE"));
        assert!(response.contains("catalyseur"));
    }
}
