// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// Mensagens de erro exibidas ao usuário, por idioma e por tipo de erro (`AppError::kind`)
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let pt = HashMap::from([
            ("validation", "Um ou mais campos são inválidos."),
            ("duplicate_grant", "Este usuário já possui essa permissão neste contexto."),
            ("unknown_scope", "Coordenação ou supervisão técnica não encontrada."),
            ("scope_mismatch", "A supervisão técnica não pertence à coordenação informada."),
            ("role_not_found", "Nível de permissão não encontrado."),
            ("user_not_found", "Usuário não encontrado."),
            ("invalid_token", "Token de autenticação inválido ou ausente."),
            ("forbidden", "Você não tem permissão para realizar esta ação."),
            (
                "status_sync_failed",
                "As permissões foram alteradas, mas o status do usuário não pôde ser atualizado.",
            ),
            ("persistence", "Falha ao acessar o banco de dados. Tente novamente."),
            ("internal", "Ocorreu um erro inesperado."),
        ]);

        let en = HashMap::from([
            ("validation", "One or more fields are invalid."),
            ("duplicate_grant", "This user already holds this permission in this context."),
            ("unknown_scope", "Coordination or technical supervision not found."),
            ("scope_mismatch", "The technical supervision does not belong to the given coordination."),
            ("role_not_found", "Permission level not found."),
            ("user_not_found", "User not found."),
            ("invalid_token", "Invalid or missing authentication token."),
            ("forbidden", "You are not allowed to perform this action."),
            (
                "status_sync_failed",
                "Permissions were changed but the user status could not be updated.",
            ),
            ("persistence", "Failed to reach the database. Please try again."),
            ("internal", "An unexpected error occurred."),
        ]);

        Self {
            messages: HashMap::from([("pt", pt), ("en", en)]),
        }
    }

    /// Idioma desconhecido cai no português; chave desconhecida volta como está.
    pub fn message<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        self.messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .copied()
            .unwrap_or(key)
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.message("de", "user_not_found"), "Usuário não encontrado.");
        assert_eq!(store.message("en", "user_not_found"), "User not found.");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.message("pt", "sem_traducao"), "sem_traducao");
    }
}
