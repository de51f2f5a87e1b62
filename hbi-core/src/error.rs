use thiserror::Error;

/// Erreurs visibles par l'appelant du Service.
///
/// Toutes sont synchrones et corrigibles côté client : aucune ne représente
/// une panne d'infrastructure, donc pas de retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HbiError {
    /// Hôte sans id ni canonical fact, ou record hôte mal formé
    #[error("Invalid host: {0}")]
    InvalidHost(String),
    /// Argument de requête qui n'est pas une liste de filtres bien formés
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Host not found: {0}")]
    NotFound(String),
}

impl HbiError {
    /// Catégorie stable pour les logs et les corps d'erreur HTTP
    pub fn category(&self) -> &'static str {
        match self {
            HbiError::InvalidHost(_) => "invalid_host",
            HbiError::InvalidQuery(_) => "invalid_query",
            HbiError::NotFound(_) => "not_found",
        }
    }
}

pub type Result<T> = std::result::Result<T, HbiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_message() {
        let err = HbiError::InvalidHost("host #2 has neither id nor canonical facts".into());
        assert_eq!(err.category(), "invalid_host");
        assert_eq!(err.to_string(), "Invalid host: host #2 has neither id nor canonical facts");
        assert_eq!(HbiError::NotFound("abc".into()).category(), "not_found");
    }
}
