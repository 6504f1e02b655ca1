use crate::list::ReferenceList;
use crate::part::PartLibrary;
use crate::reference::Reference;

/// Compact listing of references in the order given: runs of three or more
/// consecutive numbers under one prefix collapse to `R4-R7`, everything else
/// is listed individually.
///
/// `R1, R2, R4, R5, R6, R7, U1` renders as `R1, R2, R4-R7, U1`.
pub fn shorthand<'r>(
    references: impl IntoIterator<Item = &'r Reference>,
    library: &PartLibrary,
) -> String {
    let refs: Vec<&Reference> = references.into_iter().collect();
    let designator = |r: &Reference| r.designator(library.get(r.part));

    let mut parts = Vec::new();
    let mut i = 0;
    while i < refs.len() {
        let head = refs[i];
        let mut run = 1;
        if let Some(number) = head.number() {
            while i + run < refs.len()
                && refs[i + run].prefix() == head.prefix()
                && refs[i + run].number() == number.checked_add(run as u32)
            {
                run += 1;
            }
        }

        match run {
            1 => parts.push(designator(head)),
            2 => {
                parts.push(designator(head));
                parts.push(designator(refs[i + 1]));
            }
            _ => parts.push(format!(
                "{}-{}",
                designator(head),
                designator(refs[i + run - 1])
            )),
        }
        i += run;
    }

    parts.join(", ")
}

impl ReferenceList<'_> {
    /// [`shorthand`] of the list in its current order.
    pub fn shorthand(&self) -> String {
        shorthand(self.iter(), self.library())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{LibPart, LibPartId};
    use crate::reference::SheetPath;
    use std::sync::Arc;
    use uuid::Uuid;

    fn refs(raws: &[&str], part: usize) -> Vec<Reference> {
        raws.iter()
            .enumerate()
            .map(|(i, raw)| {
                Reference::new(
                    Uuid::from_u128(i as u128),
                    LibPartId(part),
                    SheetPath::root(),
                    raw,
                    Arc::from(""),
                )
            })
            .collect()
    }

    fn library() -> PartLibrary {
        PartLibrary::from(vec![LibPart::new("R"), LibPart::new("PWR").power()])
    }

    #[test]
    fn collapses_long_runs_only() {
        let lib = library();
        let list = refs(&["R1", "R2", "R4", "R5", "R6", "R7", "U1"], 0);
        assert_eq!(shorthand(&list, &lib), "R1, R2, R4-R7, U1");
    }

    #[test]
    fn prefix_change_breaks_run() {
        let lib = library();
        let list = refs(&["C1", "C2", "R3", "R4", "R5"], 0);
        assert_eq!(shorthand(&list, &lib), "C1, C2, R3-R5");
    }

    #[test]
    fn unannotated_never_joins_a_run() {
        let lib = library();
        let list = refs(&["R1", "R?", "R?", "R2"], 0);
        assert_eq!(shorthand(&list, &lib), "R1, R?, R?, R2");
    }

    #[test]
    fn power_numbers_keep_leading_zero() {
        let lib = library();
        let list = refs(&["#PWR1", "#PWR2", "#PWR3"], 1);
        assert_eq!(shorthand(&list, &lib), "#PWR01-#PWR03");
    }

    #[test]
    fn empty_input() {
        let lib = library();
        assert_eq!(shorthand(std::iter::empty(), &lib), "");
    }
}
