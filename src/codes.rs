/// Display text for the coded select values posted by the forms.
///
/// Unknown codes are shown verbatim instead of being rejected.
#[derive(Debug, Clone, Copy)]
pub struct CodeTable {
    pub name: &'static str,
    pub version: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

pub const TABLE_VERSION: &str = "2025-10-12-v2";

pub static INQUIRY_TYPES: CodeTable = CodeTable {
    name: "inquiry-type",
    version: TABLE_VERSION,
    entries: &[
        ("general", "一般的なご質問"),
        ("quote", "お見積もりについて"),
        ("process", "制作プロセスについて"),
        ("schedule", "スケジュールについて"),
        ("portfolio", "実績・ポートフォリオについて"),
        ("other", "その他"),
    ],
};

pub static PROJECT_TYPES: CodeTable = CodeTable {
    name: "project-type",
    version: TABLE_VERSION,
    entries: &[
        ("icon", "アイコン・ロゴ"),
        ("cd", "CD付録・ジャケット"),
        ("signage", "看板・サイン"),
        ("web", "ウェブサイト用イラスト"),
        ("print", "印刷物・ポスター"),
        ("other", "その他"),
    ],
};

pub static BUDGETS: CodeTable = CodeTable {
    name: "budget",
    version: TABLE_VERSION,
    entries: &[
        ("under-30000", "3万円未満"),
        ("30000-50000", "3万円〜5万円"),
        ("50000-100000", "5万円〜10万円"),
        ("100000-200000", "10万円〜20万円"),
        ("over-200000", "20万円以上"),
        ("consultation", "要相談"),
    ],
};

impl CodeTable {
    pub fn display<'a>(&self, code: &'a str) -> &'a str {
        match self.entries.iter().find(|(key, _)| *key == code) {
            Some((_, text)) => *text,
            None => {
                log::debug!("Unknown {} code passed through: {code}", self.name);
                code
            }
        }
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|(key, _)| *key)
    }
}
