// src/schema/mod.rs
//
// Static schema describing the supported statement sheets and the matching
// criteria for their canonical line items. Built once at startup and passed
// explicitly to every component; never mutated.

use std::fmt;

use regex::Regex;

/// The supported financial statement categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementType {
    pub const ALL: [StatementType; 3] = [
        StatementType::BalanceSheet,
        StatementType::IncomeStatement,
        StatementType::CashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "balance-sheet",
            StatementType::IncomeStatement => "income-statement",
            StatementType::CashFlow => "cash-flow",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An (include, optional exclude) regex pair tested against lower-cased text.
#[derive(Debug, Clone)]
pub struct MatchRule {
    include: Regex,
    exclude: Option<Regex>,
}

impl MatchRule {
    /// Compiles the rule. Patterns are part of the static schema, so a bad
    /// pattern is a programmer error and panics at construction.
    pub fn new(include: &str, exclude: Option<&str>) -> Self {
        Self {
            include: Regex::new(include).expect("Failed to compile include pattern"),
            exclude: exclude.map(|p| Regex::new(p).expect("Failed to compile exclude pattern")),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.include.is_match(text)
            && self.exclude.as_ref().map_or(true, |re| !re.is_match(text))
    }
}

/// One canonical line item and the rule that recognizes its row labels.
#[derive(Debug, Clone)]
pub struct LineItemRule {
    key: String,
    rule: MatchRule,
}

impl LineItemRule {
    pub fn new(key: &str, include: &str, exclude: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            rule: MatchRule::new(include, exclude),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Sheet-name rule plus the ordered canonical line items for one statement type.
#[derive(Debug, Clone)]
pub struct StatementSpec {
    statement: StatementType,
    sheet_rule: MatchRule,
    line_items: Vec<LineItemRule>,
}

impl StatementSpec {
    pub fn new(
        statement: StatementType,
        sheet_rule: MatchRule,
        line_items: Vec<LineItemRule>,
    ) -> Self {
        Self {
            statement,
            sheet_rule,
            line_items,
        }
    }

    pub fn statement(&self) -> StatementType {
        self.statement
    }

    /// Tests a sheet's lower-cased full name against the sheet rule.
    pub fn sheet_matches(&self, full_name: &str) -> bool {
        self.sheet_rule.matches(full_name)
    }

    /// Walks the line-item rules in declared order and returns the first whose
    /// include pattern matches and whose exclude pattern (if any) does not.
    ///
    /// First match wins. The canonical patterns intentionally overlap (a
    /// "total liabilities" pattern would also hit "total liabilities and
    /// stockholders' equity"), so declaration order and the exclude patterns
    /// together decide the winner; callers must not reorder the rules.
    pub fn classify_label(&self, label: &str) -> Option<&LineItemRule> {
        self.line_items.iter().find(|item| item.rule.matches(label))
    }

    /// Canonical keys in declared order.
    pub fn canonical_keys(&self) -> impl Iterator<Item = &str> {
        self.line_items.iter().map(|item| item.key())
    }
}

/// The full set of supported statement specs, in processing order.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    specs: Vec<StatementSpec>,
}

impl SchemaRegistry {
    pub fn new(specs: Vec<StatementSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[StatementSpec] {
        &self.specs
    }

    pub fn spec(&self, statement: StatementType) -> Option<&StatementSpec> {
        self.specs.iter().find(|s| s.statement == statement)
    }

    /// The built-in registry. Row labels and sheet names are matched after
    /// lower-casing, so the patterns are all lower-case.
    pub fn builtin() -> Self {
        let balance_sheet = StatementSpec::new(
            StatementType::BalanceSheet,
            MatchRule::new("consolidated balance sheet", Some("parenthetical")),
            vec![
                // Assets.
                LineItemRule::new("total current assets", "total current assets", None),
                LineItemRule::new("total non-current assets", "total non-current assets", None),
                LineItemRule::new("total assets", "total assets", None),
                // Liabilities.
                LineItemRule::new("total current liabilities", "total current liabilities", None),
                LineItemRule::new(
                    "total non-current liabilities",
                    "total non-current liabilities",
                    None,
                ),
                LineItemRule::new("total liabilities", "total liabilities", Some("equity")),
                // Equity.
                LineItemRule::new("total equity", "total.*equity", Some("liabilities")),
                // Liabilities and equity.
                LineItemRule::new(
                    "total liabilities and equity",
                    "total liabilities and.*equity",
                    None,
                ),
            ],
        );

        let income_statement = StatementSpec::new(
            StatementType::IncomeStatement,
            MatchRule::new(
                "consolidated statements? of (income|operations)",
                Some("comprehensive|parenthetical"),
            ),
            vec![
                LineItemRule::new("total revenue", "(total|net) (revenues?|sales)", None),
                LineItemRule::new(
                    "total operating expenses",
                    "total (operating expenses|costs and expenses)",
                    None,
                ),
                LineItemRule::new(
                    "operating income",
                    "(income|loss) from operations|operating (income|loss)",
                    None,
                ),
                LineItemRule::new("income before taxes", "(income|loss) before.*taxes", None),
                LineItemRule::new("net income", "net (income|loss)", Some("per share")),
            ],
        );

        let cash_flow = StatementSpec::new(
            StatementType::CashFlow,
            MatchRule::new("consolidated statements? of cash flows", Some("parenthetical")),
            vec![
                LineItemRule::new(
                    "net cash from operating activities",
                    "cash.*operating activities",
                    None,
                ),
                LineItemRule::new(
                    "net cash from investing activities",
                    "cash.*investing activities",
                    None,
                ),
                LineItemRule::new(
                    "net cash from financing activities",
                    "cash.*financing activities",
                    None,
                ),
                LineItemRule::new(
                    "net change in cash",
                    "(increase|decrease|change) in cash",
                    None,
                ),
                LineItemRule::new("cash at end of period", "cash.*end of (the )?(period|year)", None),
            ],
        );

        SchemaRegistry::new(vec![balance_sheet, income_statement, cash_flow])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_sheet_name_matching() {
        let registry = SchemaRegistry::builtin();
        let spec = registry.spec(StatementType::BalanceSheet).unwrap();

        assert!(spec.sheet_matches("consolidated balance sheets"));
        assert!(!spec.sheet_matches("consolidated balance sheets (parenthetical)"));
        assert!(!spec.sheet_matches("consolidated statements of operations"));
    }

    #[test]
    fn overlapping_patterns_resolve_by_order_and_exclusion() {
        let registry = SchemaRegistry::builtin();
        let spec = registry.spec(StatementType::BalanceSheet).unwrap();

        // "total liabilities" must not swallow the combined label, and the
        // combined label must not be claimed by the equity rule either.
        assert_eq!(
            spec.classify_label("total liabilities and stockholders' equity")
                .map(LineItemRule::key),
            Some("total liabilities and equity")
        );
        assert_eq!(
            spec.classify_label("total liabilities").map(LineItemRule::key),
            Some("total liabilities")
        );
        assert_eq!(
            spec.classify_label("total stockholders' equity")
                .map(LineItemRule::key),
            Some("total equity")
        );
        assert_eq!(
            spec.classify_label("total current assets").map(LineItemRule::key),
            Some("total current assets")
        );
        assert!(spec.classify_label("goodwill").is_none());
    }

    #[test]
    fn reordering_non_overlapping_rules_is_immaterial() {
        let labels = [
            "total current assets",
            "total current liabilities",
            "accounts receivable, net",
        ];

        let forward = StatementSpec::new(
            StatementType::BalanceSheet,
            MatchRule::new("consolidated balance sheet", None),
            vec![
                LineItemRule::new("total current assets", "total current assets", None),
                LineItemRule::new("total current liabilities", "total current liabilities", None),
            ],
        );
        let reversed = StatementSpec::new(
            StatementType::BalanceSheet,
            MatchRule::new("consolidated balance sheet", None),
            vec![
                LineItemRule::new("total current liabilities", "total current liabilities", None),
                LineItemRule::new("total current assets", "total current assets", None),
            ],
        );

        for label in labels {
            assert_eq!(
                forward.classify_label(label).map(LineItemRule::key),
                reversed.classify_label(label).map(LineItemRule::key),
                "classification of '{label}' changed with rule order"
            );
        }
    }

    #[test]
    fn income_statement_rules() {
        let registry = SchemaRegistry::builtin();
        let spec = registry.spec(StatementType::IncomeStatement).unwrap();

        assert!(spec.sheet_matches("consolidated statements of operations"));
        assert!(!spec.sheet_matches("consolidated statements of comprehensive income"));

        assert_eq!(
            spec.classify_label("net income").map(LineItemRule::key),
            Some("net income")
        );
        assert!(spec.classify_label("net income per share, basic").is_none());
        assert_eq!(
            spec.classify_label("income before income taxes").map(LineItemRule::key),
            Some("income before taxes")
        );
    }

    #[test]
    fn cash_flow_rules() {
        let registry = SchemaRegistry::builtin();
        let spec = registry.spec(StatementType::CashFlow).unwrap();

        assert!(spec.sheet_matches("consolidated statements of cash flows"));
        assert_eq!(
            spec.classify_label("net cash provided by operating activities")
                .map(LineItemRule::key),
            Some("net cash from operating activities")
        );
        assert_eq!(
            spec.classify_label("cash and cash equivalents at end of period")
                .map(LineItemRule::key),
            Some("cash at end of period")
        );
        assert_eq!(
            spec.classify_label("net increase in cash and cash equivalents")
                .map(LineItemRule::key),
            Some("net change in cash")
        );
    }

    #[test]
    fn builtin_declares_all_statement_types_in_order() {
        let registry = SchemaRegistry::builtin();
        let types: Vec<StatementType> =
            registry.specs().iter().map(StatementSpec::statement).collect();
        assert_eq!(types, StatementType::ALL);

        let bs_keys: Vec<&str> = registry
            .spec(StatementType::BalanceSheet)
            .unwrap()
            .canonical_keys()
            .collect();
        assert_eq!(
            bs_keys,
            vec![
                "total current assets",
                "total non-current assets",
                "total assets",
                "total current liabilities",
                "total non-current liabilities",
                "total liabilities",
                "total equity",
                "total liabilities and equity",
            ]
        );
    }
}
