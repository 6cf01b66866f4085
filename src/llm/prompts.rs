// Fixed prompts sent to the chat model. The dataset dump is appended verbatim.

pub const INSIGHTS_TITLE: &str = "10 insights sobre os dados";
pub const NEGATIVE_VALUES_TITLE: &str = "Valores negativos";

const INSIGHTS_PROMPT: &str = "O dataset a seguir contém dados do custeio administrativo \
da administração pública federal. Me informe 10 insights sobre este dataset:";

const NEGATIVE_VALUES_PROMPT: &str = "Me explique o porquê dos valores negativos. \
Quais despesas possuem mais valores negativos neste dataset?";

pub fn ten_insights(dump: &str) -> String {
    format!("{}\n\n{}", INSIGHTS_PROMPT, dump)
}

pub fn negative_values(dump: &str) -> String {
    format!("{}\n\n{}", NEGATIVE_VALUES_PROMPT, dump)
}
