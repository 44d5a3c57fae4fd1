// Address types
pub const PUBLIC_DEVICE_ADDRESS: u8 = 0x00;
pub const RANDOM_DEVICE_ADDRESS: u8 = 0x01;
pub const PUBLIC_IDENTITY_ADDRESS: u8 = 0x02;
pub const RANDOM_IDENTITY_ADDRESS: u8 = 0x03;

// Advertising Data Types
pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_128BIT_SERVICE_UUID_COMPLETE: u8 = 0x07;
pub const AD_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
pub const AD_TYPE_MANUFACTURER_SPECIFIC: u8 = 0xFF;

// Legacy advertising payload limit
pub const ADV_DATA_MAX_LEN: usize = 31;

// Advertising PDU types
pub const ADV_IND: u8 = 0x00;

// Advertising filter policy
pub const ADV_FILTER_NONE: u8 = 0x00;
pub const ADV_FILTER_CONN_ACCEPT_LIST: u8 = 0x02;

// All three primary advertising channels
pub const ADV_CHANNEL_MAP_ALL: u8 = 0x07;

// Fast advertising interval 2 (0.625 ms units)
pub const ADV_FAST_INT_MIN_2: u16 = 0x00A0; // 100 ms
pub const ADV_FAST_INT_MAX_2: u16 = 0x00F0; // 150 ms

// Nordic Semiconductor ASA
pub const COMPANY_ID_NORDIC: u16 = 0x0059;

// Maximum data length parameters
pub const DATA_LEN_MAX_OCTETS: u16 = 0x00FB; // 251
pub const DATA_LEN_MAX_TIME: u16 = 0x4290; // 17040 us
