//! Prompt sent to the local model.

/// Build the classification prompt for `message`.
///
/// The message sits between `<<<` and `>>>` so the model can tell the email
/// apart from the instructions; the answer is requested as bare JSON.
pub fn build_prompt(message: &str) -> String {
    format!(
        r#"
Você é um assistente de e-mails que responde sempre em português do Brasil.

Leia a mensagem entre as marcas <<< >>> abaixo e, em seguida, RETORNE APENAS um JSON válido com duas chaves:
- "classification": deve ser exatamente "Mina" OU "Improdutivo"
- "response": uma sugestão de resposta curta (1-3 frases), em português do Brasil.

Não escreva nada além do JSON. Exemplo de saída:
{{"classification": "Mina", "response": "Obrigado, vamos analisar e retornamos até hoje."}}

Mensagem:
<<<
{message}
>>>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_delimited() {
        let prompt = build_prompt("Servidor fora do ar");
        assert!(prompt.contains("<<<\nServidor fora do ar\n>>>"));
    }

    #[test]
    fn asks_for_both_keys_and_exact_labels() {
        let prompt = build_prompt("");
        assert!(prompt.contains("\"classification\""));
        assert!(prompt.contains("\"response\""));
        assert!(prompt.contains("exatamente \"Mina\" OU \"Improdutivo\""));
        assert!(prompt.contains(r#"{"classification": "Mina", "response": "#));
    }

    #[test]
    fn braces_in_message_are_kept_verbatim() {
        let prompt = build_prompt("{\"a\": {}}");
        assert!(prompt.contains("{\"a\": {}}"));
    }
}
