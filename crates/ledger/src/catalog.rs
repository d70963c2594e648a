use serde::Deserialize;

/// Static option lists read at startup: who works here, what is sold and how
/// it gets paid. Not user-editable at runtime.
///
/// The defaults reproduce the studio's real rosters; deployments override
/// them from the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub artists: Vec<String>,
    pub services: Vec<String>,
    pub payment_methods: Vec<String>,
    pub default_service: String,
    pub default_payment_method: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            artists: vec![
                "Jhully".to_string(),
                "Aryan".to_string(),
                "Salomão".to_string(),
                "Lih".to_string(),
                "Guest 1".to_string(),
            ],
            services: vec![
                "Tatuagem".to_string(),
                "Sinal/Reserva".to_string(),
                "Piercing".to_string(),
                "Joia".to_string(),
                "Retoque".to_string(),
                "Curso/Workshop".to_string(),
            ],
            payment_methods: vec![
                "Pix".to_string(),
                "Dinheiro".to_string(),
                "Débito".to_string(),
                "Crédito 1x".to_string(),
                "Crédito Parc.".to_string(),
            ],
            default_service: "Tatuagem".to_string(),
            default_payment_method: "Pix".to_string(),
        }
    }
}

impl Catalog {
    #[must_use]
    pub fn has_artist(&self, name: &str) -> bool {
        self.artists.iter().any(|a| a == name)
    }

    #[must_use]
    pub fn has_service(&self, name: &str) -> bool {
        self.services.iter().any(|s| s == name)
    }

    #[must_use]
    pub fn has_payment_method(&self, name: &str) -> bool {
        self.payment_methods.iter().any(|p| p == name)
    }
}
