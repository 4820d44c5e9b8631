//! Common regex patterns for fraud screening.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Keyword classes. A keyword rule matches only when every class of its
    // set is present somewhere in the content.
    pub static ref KW_INVOICE: Regex = Regex::new(r"(?i)\binvoices?\b").unwrap();
    pub static ref KW_URGENT: Regex = Regex::new(r"(?i)\burgent(?:ly)?\b").unwrap();
    pub static ref KW_PAYMENT: Regex = Regex::new(r"(?i)\bpayments?\b").unwrap();
    pub static ref KW_REFERRAL: Regex = Regex::new(r"(?i)\breferrals?\b").unwrap();
    pub static ref KW_COMMISSION: Regex = Regex::new(r"(?i)\bcommissions?\b").unwrap();
    pub static ref KW_ADVANCE: Regex = Regex::new(r"(?i)\badvance\b").unwrap();
    pub static ref KW_REQUIRED: Regex = Regex::new(r"(?i)\brequired\b").unwrap();

    // Labelled vendor / company names
    pub static ref VENDOR_LABEL: Regex = Regex::new(
        r"(?imR)^[ \t]*(?:vendor|supplier|seller|bill(?:ed)?\s+from|company|payee)(?:\s+name)?[ \t]*[:\-][ \t]*([^\r\n,;\t]+)"
    ).unwrap();

    // Labelled payment identifiers (IBAN, account numbers)
    pub static ref ACCOUNT_LABEL: Regex = Regex::new(
        r"(?i)(?:\biban|\bbank\s+account|\baccount|\bacct)(?:\s*(?:no\.?|number|#))?[ \t]*[:\-#]?[ \t]*(?-i:([A-Z]{2}\d{2}(?:[ ]?[A-Z0-9]{4})+(?:[ ]?[A-Z0-9]{1,4})?|\d[\d \-]{3,38}\d))"
    ).unwrap();

    // Text line items: "<item> [: or -] [$€£]<price>"
    pub static ref LINE_ITEM: Regex = Regex::new(
        r"(?mR)^[ \t]*([A-Za-z][A-Za-z0-9 &/()'.\-]*?)[ \t]*[:\-]?[ \t]+(?:[$€£][ \t]*)?(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)[ \t]*$"
    ).unwrap();

    // Column headers in tabular content
    pub static ref ITEM_HEADER: Regex = Regex::new(
        r"(?i)^\s*(?:item|description|product|service|article)(?:\s+(?:name|description))?\s*$"
    ).unwrap();

    pub static ref PRICE_HEADER: Regex = Regex::new(
        r"(?i)^\s*(?:unit\s+)?(?:price|rate|cost|amount)(?:\s*\(.*\))?\s*$"
    ).unwrap();

    pub static ref VENDOR_HEADER: Regex = Regex::new(
        r"(?i)^\s*(?:vendor|supplier|seller|company|payee)(?:\s+name)?\s*$"
    ).unwrap();

    pub static ref ACCOUNT_HEADER: Regex = Regex::new(
        r"(?i)^\s*(?:iban|bank\s+account|account(?:\s+(?:no\.?|number))?|acct\.?)\s*$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_boundaries() {
        assert!(KW_INVOICE.is_match("Invoices attached"));
        assert!(!KW_INVOICE.is_match("invoiced"));
        assert!(KW_URGENT.is_match("URGENTLY"));
        assert!(!KW_ADVANCE.is_match("advanced"));
    }

    #[test]
    fn test_vendor_label() {
        let caps = VENDOR_LABEL.captures("Invoice 12\nVendor: Acme Supplies, Berlin\n").unwrap();
        assert_eq!(caps[1].trim(), "Acme Supplies");

        let caps = VENDOR_LABEL.captures("Bill from - Globex Corp").unwrap();
        assert_eq!(caps[1].trim(), "Globex Corp");
    }

    #[test]
    fn test_account_label() {
        let caps = ACCOUNT_LABEL.captures("IBAN: DE89 3704 0044 0532 0130 00").unwrap();
        assert_eq!(&caps[1], "DE89 3704 0044 0532 0130 00");

        let caps = ACCOUNT_LABEL.captures("Account No. 12-3456-789").unwrap();
        assert_eq!(&caps[1], "12-3456-789");
    }

    #[test]
    fn test_account_label_stops_at_words() {
        let caps = ACCOUNT_LABEL.captures("Account: 12345678 Due in 30 days").unwrap();
        assert_eq!(&caps[1], "12345678");

        let caps = ACCOUNT_LABEL.captures("iban GB29 NWBK 6016 1331 9268 19").unwrap();
        assert_eq!(&caps[1], "GB29 NWBK 6016 1331 9268 19");
    }

    #[test]
    fn test_line_item() {
        let caps = LINE_ITEM.captures("Office chair: $1,250.00").unwrap();
        assert_eq!(&caps[1], "Office chair");
        assert_eq!(&caps[2], "1,250.00");

        assert!(LINE_ITEM.captures("Printer paper 25").is_some());
        assert!(LINE_ITEM.captures("Cables - 12.5\r\nnext").is_some());
        assert!(LINE_ITEM.captures("no price on this line").is_none());
    }
}
