//! 수집 대상 종목과 기준 종목 정보.

use renta_core::Equity;

/// 기본 수집 대상 종목 (29개).
pub const BVC_SYMBOLS: [&str; 29] = [
    "ABC.A", "ALZ.B", "BNC", "BPV", "BVCC", "BVL", "CCR", "CGQ", "CRM.A", "DOM", "EFE", "ENV",
    "FNC", "GMC.B", "GZL", "ICP.B", "IVC.A", "IVC.B", "MPA", "MTC.B", "MVZ.A", "MVZ.B", "PGR",
    "PIV.B", "PTN", "RST", "RST.B", "SVS", "TDV.D",
];

/// 기본 수집 대상을 `String` 목록으로 반환합니다.
pub fn default_symbols() -> Vec<String> {
    BVC_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

/// 초기 등록용 기준 종목과 발행주식수.
pub fn reference_equities() -> Vec<Equity> {
    [
        ("ABC.A", "Banco ABC - Clase A", 1_000_000_000),
        ("ALZ.B", "Almacenes La Estrella - Clase B", 800_000_000),
        ("BNC", "Banco Nacional de Crédito", 1_500_000_000),
        ("BPV", "Banco Provincial", 2_000_000_000),
        ("BVCC", "Bolsa de Valores de Caracas", 500_000_000),
        ("BVL", "Banco de Venezuela", 1_200_000_000),
        ("CCR", "Caroní", 600_000_000),
        ("MERC", "Banco Mercantil", 1_800_000_000),
    ]
    .into_iter()
    .map(|(code, name, shares)| Equity::new(code, name, Some(shares)))
    .collect()
}
