use dyn_clone::DynClone;
use iso_currency::Currency;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

#[typetag::serde(tag = "type")]
pub trait SerdeGenericTrait: DynClone + Debug + Send + Sync {
    fn any_ref(&self) -> &dyn Any;
}

dyn_clone::clone_trait_object!(SerdeGenericTrait);

impl dyn SerdeGenericTrait {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.any_ref().downcast_ref()
    }
}

// List of fiat payment methods from
// https://github.com/bisq-network/bisq/blob/release/v1.9.10/core/src/main/java/bisq/core/payment/payload/PaymentMethod.java
// We are not implementing trade limits and risk association here. This should be for the higher level to determine.

#[derive(
    PartialEq, Eq, Hash, Clone, Debug, Serialize, Deserialize, EnumString, Display, IntoStaticStr,
)]
pub enum FiatPaymentMethod {
    Uphold,
    MoneyBeam,
    PopMoney,
    Revolut,
    PerfectMoney,
    Sepa,
    SepaInstant,
    FasterPayments,
    NationalBank,
    JapanBank,
    AustraliaPayID,
    Swish,
    AliPay,
    WeChatPay,
    Zelle,
    InteracETransfer,
    USPostalMoneyOrder,
    CashDeposit,
    MoneyGram,
    WesternUnion,
    FaceToFace,
    HalCash,
    PromptPay,
    AdvancedCash,
    TransferWise,
    Paysera,
    Paxum,
    NEFT, // National Electronic Funds Transfer - an electronic funds transfer system maintained by the Reserve Bank of India.
    RTGS, // Real Time Gross Settlment
    IMPS, // Immediate Payment Service - an instant payment inter-bank electronic funds transfer system in India
    UPI, // Unified Payments Interface (UPI) - an instant payment system developed by National Payments Corporation of India (NPCI)
    Paytm,
    Nequi,
    Bizum,
    Pix,
    AmazonGiftCard,
    CashByMail,
    Capitual,
    Celpay,
    Monese,
    Satispay,
    Tikkie,
    Verse,
    Strike,
    SWIFT,
    ACHTransfer,
    DomesticWireTransfer,
    OkPay,
    CashApp,
    Venmo,
}

/// Payment account descriptor exchanged with the counterparty so it can verify
/// the fiat leg of the trade. Free-form detail fields are engine specific.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct PaymentAccount {
    pub currency: Currency,
    pub method: FiatPaymentMethod,
    pub details: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn fiat_payment_method_string_round_trip() {
        let method = FiatPaymentMethod::WeChatPay;
        let method_string = method.to_string();
        assert_eq!(
            FiatPaymentMethod::from_str(&method_string).unwrap(),
            method
        );
    }

    #[test]
    fn payment_account_serde_round_trip() {
        let account = PaymentAccount {
            currency: Currency::CNY,
            method: FiatPaymentMethod::AliPay,
            details: HashMap::from([("account_name".to_string(), "some-name".to_string())]),
        };
        let json = serde_json::to_string(&account).unwrap();
        let restored: PaymentAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, account);
    }
}
