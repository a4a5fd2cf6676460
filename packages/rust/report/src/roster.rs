//! Static contact roster for enhancer-injected contact blocks.
//!
//! These are the desks a crisis report must reach regardless of what the
//! department ranking returned. Numbers are direct lines, not switchboard.

pub struct ContactEntry {
    pub department: &'static str,
    pub owner: &'static str,
    pub direct_line: &'static str,
}

pub const LEGAL: ContactEntry = ContactEntry {
    department: "법무그룹",
    owner: "김준호 그룹장",
    direct_line: "02-759-2150",
};

pub const ESG: ContactEntry = ContactEntry {
    department: "ESG그룹",
    owner: "이서연 그룹장",
    direct_line: "02-759-2310",
};

pub const EXTERNAL_AFFAIRS: ContactEntry = ContactEntry {
    department: "대외협력그룹",
    owner: "박민재 그룹장",
    direct_line: "02-759-2240",
};

pub const ENERGY_OPS: ContactEntry = ContactEntry {
    department: "에너지사업부",
    owner: "최현우 상무",
    direct_line: "02-759-3410",
};

pub const IR: ContactEntry = ContactEntry {
    department: "IR그룹",
    owner: "정다은 그룹장",
    direct_line: "02-759-2120",
};

/// Contact set for a crisis-level report. Energy issues add the energy
/// operations desk on top of the generic high-risk set.
pub fn crisis_contacts(energy: bool) -> Vec<&'static ContactEntry> {
    let mut contacts = vec![&LEGAL, &ESG, &EXTERNAL_AFFAIRS];
    if energy {
        contacts.push(&ENERGY_OPS);
    }
    contacts
}

impl ContactEntry {
    /// One roster line as it appears inside section 4.
    pub fn as_line(&self) -> String {
        format!("  · {}/{} (직통 {})", self.department, self.owner, self.direct_line)
    }
}
